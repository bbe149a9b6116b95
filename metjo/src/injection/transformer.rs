//! File-level transform: parse, select, inject, print.
//!
//! One source file is the unit of transformation. The walker visits the
//! file's items and inline modules, impl blocks, trait default methods and
//! foreign blocks; items nested inside function bodies are left alone.

use log::{debug, warn};
use metjo_probe::{MethodKey, PATH_SEPARATOR};
use quote::ToTokens;
use syn::ext::IdentExt;
use syn::visit_mut::VisitMut;
use syn::{
    Attribute, Block, ForeignItem, ImplItem, Item, ItemForeignMod, ItemImpl, ItemMod, ItemTrait,
    Signature, TraitItem, Type,
};

use super::injector::CodeInjector;
use crate::domain::{
    FunctionOutcome, FunctionReport, InstrumentError, PatternError, SkipReason, TransformError,
};
use crate::selection::{is_automatically_derived, skip_reason, timed_marker, MethodSelector};

/// Result of transforming one file.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub module_path: String,
    /// Rewritten source, or `None` when nothing was instrumented and the
    /// original should be used unchanged.
    pub source: Option<String>,
    /// One entry per candidate function, in source order.
    pub functions: Vec<FunctionReport>,
}

impl Transformed {
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.source.is_none()
    }

    /// Number of functions that received a probe in this pass.
    #[must_use]
    pub fn instrumented_count(&self) -> usize {
        self.functions
            .iter()
            .filter(|f| matches!(f.outcome, FunctionOutcome::Instrumented { .. }))
            .count()
    }

    /// Functions whose rewrite failed.
    pub fn failures(&self) -> impl Iterator<Item = &FunctionReport> {
        self.functions.iter().filter(|f| matches!(f.outcome, FunctionOutcome::Failed(_)))
    }
}

/// Selector plus injector, applied file by file.
pub struct Transformer {
    selector: MethodSelector,
    injector: CodeInjector,
}

impl Transformer {
    #[must_use]
    pub fn new(selector: MethodSelector, injector: CodeInjector) -> Self {
        Self { selector, injector }
    }

    /// # Errors
    /// Returns an error if the configured patterns cannot be compiled.
    pub fn from_config(config: &metjo_probe::ProfilerConfig) -> Result<Self, PatternError> {
        Ok(Self::new(MethodSelector::from_config(config)?, CodeInjector::new()))
    }

    #[must_use]
    pub fn selector(&self) -> &MethodSelector {
        &self.selector
    }

    /// Transform the source of the module at `module_path`.
    ///
    /// # Errors
    /// Returns [`TransformError::Parse`] if `source` is not valid Rust. Per
    /// function failures are reported in [`Transformed::functions`] instead.
    pub fn transform(&self, module_path: &str, source: &str) -> Result<Transformed, TransformError> {
        let mut file = syn::parse_file(source)
            .map_err(|source| TransformError::Parse { module: module_path.to_string(), source })?;

        let mut walker = Walker {
            transformer: self,
            modules: vec![module_path.to_string()],
            functions: Vec::new(),
            instrumented: 0,
        };
        walker.visit_file_mut(&mut file);

        let source = if walker.instrumented == 0 {
            debug!("{module_path}: nothing instrumented, source unchanged");
            None
        } else {
            debug!("{module_path}: instrumented {} function(s)", walker.instrumented);
            Some(prettyplease::unparse(&file))
        };
        Ok(Transformed { module_path: module_path.to_string(), source, functions: walker.functions })
    }
}

/// Enclosing impl or trait of the functions being visited.
struct Owner {
    path: String,
    synthesized: bool,
}

struct Walker<'a> {
    transformer: &'a Transformer,
    modules: Vec<String>,
    functions: Vec<FunctionReport>,
    instrumented: usize,
}

impl Walker<'_> {
    fn module_path(&self) -> String {
        let segments: Vec<&str> =
            self.modules.iter().map(String::as_str).filter(|m| !m.is_empty()).collect();
        segments.join(PATH_SEPARATOR)
    }

    fn owner_path(&self, name: &str) -> String {
        let module = self.module_path();
        if module.is_empty() {
            name.to_string()
        } else {
            format!("{module}{PATH_SEPARATOR}{name}")
        }
    }

    fn record(&mut self, key: MethodKey, outcome: FunctionOutcome) {
        self.functions.push(FunctionReport { key, outcome });
    }

    fn skip(&mut self, key: MethodKey, reason: SkipReason) {
        debug!("Skipping {key}: {reason}");
        self.record(key, FunctionOutcome::Skipped(reason));
    }

    fn candidate(
        &mut self,
        declaring_type: String,
        attrs: &[Attribute],
        sig: &Signature,
        body: Option<&mut Block>,
        synthesized: bool,
    ) {
        let key = MethodKey::new(declaring_type, sig.ident.unraw().to_string());
        if let Some(reason) = skip_reason(sig, body.as_deref(), synthesized) {
            self.skip(key, reason);
            return;
        }
        let Some(body) = body else {
            return;
        };

        let decision = self.transformer.selector.decide(key, timed_marker(attrs));
        if !decision.should_instrument {
            self.record(decision.key, FunctionOutcome::NotSelected);
            return;
        }

        let outcome = match self.transformer.injector.inject(sig, attrs, body, &decision) {
            Ok(()) => {
                self.instrumented += 1;
                FunctionOutcome::Instrumented {
                    metric_name: decision.metric_name,
                    captures_parameters: decision.captures_parameters,
                }
            }
            Err(InstrumentError::AlreadyInstrumented(_)) => {
                debug!("{} already instrumented", decision.key);
                FunctionOutcome::AlreadyInstrumented
            }
            Err(e) => {
                warn!("Failed to instrument {}: {e}", decision.key);
                FunctionOutcome::Failed(e.to_string())
            }
        };
        self.record(decision.key, outcome);
    }

    fn visit_owner_items(&mut self, owner: &Owner, items: &mut [ImplItem]) {
        for item in items {
            if let ImplItem::Fn(f) = item {
                self.candidate(owner.path.clone(), &f.attrs, &f.sig, Some(&mut f.block), owner.synthesized);
            }
        }
    }
}

impl VisitMut for Walker<'_> {
    fn visit_item_mut(&mut self, item: &mut Item) {
        match item {
            Item::Fn(f) => {
                let module = self.module_path();
                self.candidate(module, &f.attrs, &f.sig, Some(&mut *f.block), false);
            }
            Item::Mod(m) => self.visit_item_mod_mut(m),
            Item::Impl(i) => self.visit_item_impl_mut(i),
            Item::Trait(t) => self.visit_item_trait_mut(t),
            Item::ForeignMod(f) => self.visit_item_foreign_mod_mut(f),
            _ => {}
        }
    }

    fn visit_item_mod_mut(&mut self, m: &mut ItemMod) {
        let Some((_, items)) = &mut m.content else {
            return;
        };
        self.modules.push(m.ident.unraw().to_string());
        for item in items {
            self.visit_item_mut(item);
        }
        self.modules.pop();
    }

    fn visit_item_impl_mut(&mut self, i: &mut ItemImpl) {
        let owner = Owner {
            path: self.owner_path(&type_name(&i.self_ty)),
            synthesized: is_automatically_derived(&i.attrs),
        };
        self.visit_owner_items(&owner, &mut i.items);
    }

    fn visit_item_trait_mut(&mut self, t: &mut ItemTrait) {
        let path = self.owner_path(&t.ident.unraw().to_string());
        for item in &mut t.items {
            if let TraitItem::Fn(f) = item {
                self.candidate(path.clone(), &f.attrs, &f.sig, f.default.as_mut(), false);
            }
        }
    }

    fn visit_item_foreign_mod_mut(&mut self, f: &mut ItemForeignMod) {
        let module = self.module_path();
        for item in &f.items {
            if let ForeignItem::Fn(foreign) = item {
                let key = MethodKey::new(module.clone(), foreign.sig.ident.unraw().to_string());
                self.skip(key, SkipReason::NoBody);
            }
        }
    }
}

/// Name used for an impl's `Self` type: the last path segment without
/// generics, or the compact token text for other types.
fn type_name(ty: &Type) -> String {
    match ty {
        Type::Path(path) if path.qself.is_none() => path
            .path
            .segments
            .last()
            .map_or_else(|| compact(ty), |segment| segment.ident.unraw().to_string()),
        Type::Reference(reference) => type_name(&reference.elem),
        Type::Paren(inner) => type_name(&inner.elem),
        Type::Group(inner) => type_name(&inner.elem),
        other => compact(other),
    }
}

fn compact(ty: &Type) -> String {
    ty.to_token_stream().to_string().split_whitespace().collect()
}
