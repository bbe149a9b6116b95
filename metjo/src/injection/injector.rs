//! Entry probe injection into a single function body.
//!
//! The probe is one `let` statement placed first in the body:
//!
//! ```ignore
//! let __metjo_guard = ::metjo_probe::probe_entry(
//!     "acme::Cart::add",                       // metric name
//!     "acme::Cart::add",                       // fully-qualified name
//!     &[::metjo_probe::ProbeArg::Opaque, ::metjo_probe::ProbeArg::from(qty)],
//!     true,                                    // captures parameters
//! );
//! ```
//!
//! The guard lives until the body's scope ends, so its `Drop` (the exit probe)
//! runs on fall-through, `return`, `?` and unwinding. The argument slice is
//! only built when the function has capture specs.

use proc_macro2::Span;
use quote::quote;
use syn::{parse_quote, Attribute, Block, FnArg, Ident, Pat, Signature, Stmt, Type};

use crate::domain::{InstrumentError, InstrumentationDecision};
use crate::selection::is_naked;

/// Name of the local that holds the entry probe's guard.
pub const GUARD_IDENT: &str = "__metjo_guard";

const NUMERIC_TYPES: &[&str] = &[
    "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128", "usize",
    "f32", "f64",
];

/// Rewrites selected function bodies.
#[derive(Debug, Clone)]
pub struct CodeInjector {
    runtime: syn::Path,
}

impl CodeInjector {
    /// Injector emitting calls into `::metjo_probe`.
    #[must_use]
    pub fn new() -> Self {
        Self { runtime: parse_quote!(::metjo_probe) }
    }

    /// Injector for a runtime crate reachable under another path.
    #[must_use]
    pub fn with_runtime_path(runtime: syn::Path) -> Self {
        Self { runtime }
    }

    /// Insert the entry probe as the first statement of `block`.
    ///
    /// # Errors
    /// Leaves `block` untouched and returns an error if the function is
    /// naked, already starts with an entry probe, or has a parameter named
    /// like the guard.
    pub fn inject(
        &self,
        sig: &Signature,
        attrs: &[Attribute],
        block: &mut Block,
        decision: &InstrumentationDecision,
    ) -> Result<(), InstrumentError> {
        let function = decision.key.fully_qualified_name();

        if is_naked(attrs) {
            return Err(InstrumentError::UnsupportedShape {
                function: function.to_string(),
                reason: "naked functions may only contain inline assembly",
            });
        }
        if starts_with_probe(block) {
            return Err(InstrumentError::AlreadyInstrumented(function.to_string()));
        }
        if let Some(ident) = parameter_idents(sig).find(|ident| *ident == GUARD_IDENT) {
            return Err(InstrumentError::ReservedIdentifier {
                function: function.to_string(),
                ident: ident.to_string(),
            });
        }

        let runtime = &self.runtime;
        let guard = Ident::new(GUARD_IDENT, Span::call_site());
        let metric = &decision.metric_name;
        let captures = decision.captures_parameters;
        let args = if captures {
            let values = sig.inputs.iter().filter_map(|input| match input {
                FnArg::Receiver(_) => None,
                FnArg::Typed(typed) => Some(probe_arg(runtime, &typed.pat, &typed.ty)),
            });
            quote!(&[#(#values),*])
        } else {
            quote!(&[])
        };

        let stmt: Stmt = parse_quote! {
            let #guard = #runtime::probe_entry(#metric, #function, #args, #captures);
        };
        block.stmts.insert(0, stmt);
        Ok(())
    }
}

impl Default for CodeInjector {
    fn default() -> Self {
        Self::new()
    }
}

/// `ProbeArg` expression for one declared parameter.
fn probe_arg(runtime: &syn::Path, pat: &Pat, ty: &Type) -> proc_macro2::TokenStream {
    let binding = match pat {
        Pat::Ident(pat_ident) if pat_ident.by_ref.is_none() && pat_ident.subpat.is_none() => {
            Some(&pat_ident.ident)
        }
        _ => None,
    };
    match (binding, numeric_kind(ty)) {
        (Some(ident), Some(Numeric::Value)) => quote!(#runtime::ProbeArg::from(#ident)),
        (Some(ident), Some(Numeric::Reference)) => quote!(#runtime::ProbeArg::from(*#ident)),
        _ => quote!(#runtime::ProbeArg::Opaque),
    }
}

enum Numeric {
    Value,
    Reference,
}

fn numeric_kind(ty: &Type) -> Option<Numeric> {
    match ty {
        Type::Paren(inner) => numeric_kind(&inner.elem),
        Type::Group(inner) => numeric_kind(&inner.elem),
        Type::Reference(reference) if is_numeric_primitive(&reference.elem) => Some(Numeric::Reference),
        other if is_numeric_primitive(other) => Some(Numeric::Value),
        _ => None,
    }
}

fn is_numeric_primitive(ty: &Type) -> bool {
    match ty {
        Type::Paren(inner) => is_numeric_primitive(&inner.elem),
        Type::Group(inner) => is_numeric_primitive(&inner.elem),
        Type::Path(path) if path.qself.is_none() => path
            .path
            .get_ident()
            .is_some_and(|ident| NUMERIC_TYPES.iter().any(|name| ident == name)),
        _ => false,
    }
}

/// Identifiers bound by the declared parameters.
fn parameter_idents(sig: &Signature) -> impl Iterator<Item = &Ident> {
    fn collect<'a>(pat: &'a Pat, out: &mut Vec<&'a Ident>) {
        match pat {
            Pat::Ident(pat_ident) => {
                out.push(&pat_ident.ident);
                if let Some((_, sub)) = &pat_ident.subpat {
                    collect(sub, out);
                }
            }
            Pat::Tuple(tuple) => tuple.elems.iter().for_each(|p| collect(p, out)),
            Pat::TupleStruct(tuple) => tuple.elems.iter().for_each(|p| collect(p, out)),
            Pat::Struct(strukt) => strukt.fields.iter().for_each(|f| collect(&f.pat, out)),
            Pat::Slice(slice) => slice.elems.iter().for_each(|p| collect(p, out)),
            Pat::Reference(reference) => collect(&reference.pat, out),
            Pat::Paren(paren) => collect(&paren.pat, out),
            Pat::Type(typed) => collect(&typed.pat, out),
            _ => {}
        }
    }

    let mut idents = Vec::new();
    for input in &sig.inputs {
        if let FnArg::Typed(typed) = input {
            collect(&typed.pat, &mut idents);
        }
    }
    idents.into_iter()
}

/// Whether the first statement is `let __metjo_guard = ...`.
fn starts_with_probe(block: &Block) -> bool {
    let Some(Stmt::Local(local)) = block.stmts.first() else {
        return false;
    };
    matches!(&local.pat, Pat::Ident(pat_ident) if pat_ident.ident == GUARD_IDENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use metjo_probe::MethodKey;
    use syn::ItemFn;

    fn decision(fq: &str, metric: &str, captures: bool) -> InstrumentationDecision {
        InstrumentationDecision {
            key: MethodKey::parse(fq),
            should_instrument: true,
            metric_name: metric.to_string(),
            captures_parameters: captures,
            forced_by_marker: false,
        }
    }

    fn first_stmt(item: &ItemFn) -> String {
        let stmt = &item.block.stmts[0];
        quote!(#stmt).to_string().split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_inject_without_captures_passes_empty_args() {
        let mut item: ItemFn = parse_quote! { fn compute(x: u32) -> u32 { x * 2 } };
        CodeInjector::new()
            .inject(&item.sig, &item.attrs, &mut item.block, &decision("acme::compute", "acme::compute", false))
            .unwrap();

        assert_eq!(item.block.stmts.len(), 2);
        let stmt = first_stmt(&item);
        assert!(stmt.starts_with("let __metjo_guard = :: metjo_probe :: probe_entry"));
        assert!(stmt.contains("\"acme::compute\" , \"acme::compute\" , & [] , false"));
    }

    #[test]
    fn test_inject_with_captures_builds_args() {
        let mut item: ItemFn = parse_quote! {
            fn add(&self, label: &str, qty: u32, weight: &f64, (a, b): (i32, i32), count: &mut usize) {
                work();
            }
        };
        let sig = item.sig.clone();
        CodeInjector::new()
            .inject(&sig, &item.attrs, &mut item.block, &decision("acme::Cart::add", "add", true))
            .unwrap();

        let stmt = first_stmt(&item);
        assert!(stmt.contains("\"add\" , \"acme::Cart::add\""));
        assert!(stmt.contains(
            "& [:: metjo_probe :: ProbeArg :: Opaque , :: metjo_probe :: ProbeArg :: from (qty) , \
             :: metjo_probe :: ProbeArg :: from (* weight) , :: metjo_probe :: ProbeArg :: Opaque , \
             :: metjo_probe :: ProbeArg :: from (* count)] , true"
        ));
    }

    #[test]
    fn test_inject_is_not_repeated() {
        let mut item: ItemFn = parse_quote! { fn f() { work(); } };
        let injector = CodeInjector::new();
        let d = decision("acme::f", "acme::f", false);
        injector.inject(&item.sig.clone(), &[], &mut item.block, &d).unwrap();

        let err = injector.inject(&item.sig.clone(), &[], &mut item.block, &d).unwrap_err();
        assert_eq!(err, InstrumentError::AlreadyInstrumented("acme::f".to_string()));
        assert_eq!(item.block.stmts.len(), 2);
    }

    #[test]
    fn test_reserved_identifier_is_rejected() {
        let mut item: ItemFn = parse_quote! { fn f(__metjo_guard: u8) { work(); } };
        let err = CodeInjector::new()
            .inject(&item.sig.clone(), &[], &mut item.block, &decision("acme::f", "acme::f", false))
            .unwrap_err();
        assert!(matches!(err, InstrumentError::ReservedIdentifier { .. }));
        assert_eq!(item.block.stmts.len(), 1);
    }

    #[test]
    fn test_naked_function_is_rejected() {
        let mut item: ItemFn = parse_quote! { #[naked] extern "C" fn f() { asm(); } };
        let attrs = item.attrs.clone();
        let err = CodeInjector::new()
            .inject(&item.sig.clone(), &attrs, &mut item.block, &decision("acme::f", "acme::f", false))
            .unwrap_err();
        assert!(matches!(err, InstrumentError::UnsupportedShape { .. }));
    }

    #[test]
    fn test_custom_runtime_path() {
        let mut item: ItemFn = parse_quote! { fn f() { work(); } };
        CodeInjector::with_runtime_path(parse_quote!(crate::probes))
            .inject(&item.sig.clone(), &[], &mut item.block, &decision("acme::f", "acme::f", false))
            .unwrap();
        assert!(first_stmt(&item).contains("crate :: probes :: probe_entry"));
    }
}
