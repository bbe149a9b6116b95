//! Declarative opt-in marker for metjo instrumentation.
//!
//! `#[timed]` marks a function for instrumentation regardless of the
//! include/exclude patterns configured for `metjo instrument`. The attribute
//! itself expands to the unchanged function: the rewriter reads it from the
//! source, so code compiled without instrumentation is unaffected.
//!
//! ```ignore
//! use metjo_probe::timed;
//!
//! impl Worker {
//!     #[timed]                 // metric: crate::worker::Worker::run
//!     fn run(&self) {}
//!
//!     #[timed(relative)]       // metric: handle
//!     fn handle(&self, job: u64) {}
//! }
//! ```
//!
//! `#[timed(absolute = false)]` is accepted as a synonym for `relative`.

use proc_macro::TokenStream;
use proc_macro2::Span;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Expr, ExprLit, Lit, Meta, Token};

/// Mark a function for instrumentation.
///
/// Accepted forms: `#[timed]`, `#[timed(relative)]`,
/// `#[timed(absolute = true | false)]`.
#[proc_macro_attribute]
pub fn timed(args: TokenStream, item: TokenStream) -> TokenStream {
    if let Err(err) = validate_args(args.into()) {
        return with_error(err, item);
    }

    let item2: proc_macro2::TokenStream = item.clone().into();
    let is_fn = syn::parse2::<syn::ItemFn>(item2.clone()).is_ok()
        || syn::parse2::<syn::ImplItemFn>(item2.clone()).is_ok()
        || syn::parse2::<syn::TraitItemFn>(item2).is_ok();
    if !is_fn {
        let err = syn::Error::new(Span::call_site(), "#[timed] can only be applied to functions");
        return with_error(err, item);
    }

    item
}

fn validate_args(args: proc_macro2::TokenStream) -> syn::Result<()> {
    let metas = Punctuated::<Meta, Token![,]>::parse_terminated.parse2(args)?;
    for meta in metas {
        match &meta {
            Meta::Path(path) if path.is_ident("relative") => {}
            Meta::NameValue(nv) if nv.path.is_ident("absolute") => match &nv.value {
                Expr::Lit(ExprLit { lit: Lit::Bool(_), .. }) => {}
                other => {
                    return Err(syn::Error::new_spanned(other, "`absolute` expects `true` or `false`"))
                }
            },
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "unknown #[timed] argument, expected `relative` or `absolute = <bool>`",
                ))
            }
        }
    }
    Ok(())
}

fn with_error(err: syn::Error, item: TokenStream) -> TokenStream {
    let mut out: TokenStream = err.to_compile_error().into();
    out.extend(item);
    out
}
