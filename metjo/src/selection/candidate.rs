//! Candidate classification: which functions can be rewritten at all.
//!
//! # Classification Strategy
//!
//! 1. **Shape** - a function without a body (trait method without default,
//!    foreign item) or with an empty body has nothing to wrap
//! 2. **Qualifiers** - `const fn` bodies cannot call the runtime and
//!    `async fn` bodies may resume on another thread
//! 3. **Origin** - items of `#[automatically_derived]` impls are
//!    compiler-generated
//!
//! Marker attributes are recognised by their last path segment, so `timed`,
//! `metjo_probe::timed` and a renamed import all count.

use log::debug;
use syn::punctuated::Punctuated;
use syn::{Attribute, Block, Expr, ExprLit, Lit, Meta, Signature, Token};

use crate::domain::{SkipReason, TimedMarker};

/// Why `sig` with `body` must not be rewritten, if anything.
#[must_use]
pub fn skip_reason(sig: &Signature, body: Option<&Block>, synthesized: bool) -> Option<SkipReason> {
    let Some(body) = body else {
        return Some(SkipReason::NoBody);
    };
    if synthesized {
        Some(SkipReason::Synthesized)
    } else if sig.constness.is_some() {
        Some(SkipReason::ConstFn)
    } else if sig.asyncness.is_some() {
        Some(SkipReason::AsyncFn)
    } else if body.stmts.is_empty() {
        Some(SkipReason::EmptyBody)
    } else {
        None
    }
}

/// `#[timed]` marker carried by a function, if any.
///
/// `#[timed(relative)]` and `#[timed(absolute = false)]` request the bare
/// name; anything else unparseable falls back to absolute naming.
#[must_use]
pub fn timed_marker(attrs: &[Attribute]) -> Option<TimedMarker> {
    let attr = attrs.iter().find(|attr| last_segment_is(attr.path(), "timed"))?;
    let Meta::List(list) = &attr.meta else {
        return Some(TimedMarker::Absolute);
    };

    let args = match list.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated) {
        Ok(args) => args,
        Err(e) => {
            debug!("Unparseable #[timed] arguments ({e}), using absolute naming");
            return Some(TimedMarker::Absolute);
        }
    };

    let mut marker = TimedMarker::Absolute;
    for arg in &args {
        match arg {
            Meta::Path(path) if path.is_ident("relative") => marker = TimedMarker::Relative,
            Meta::NameValue(nv) if nv.path.is_ident("absolute") => {
                if let Expr::Lit(ExprLit { lit: Lit::Bool(absolute), .. }) = &nv.value {
                    marker =
                        if absolute.value { TimedMarker::Absolute } else { TimedMarker::Relative };
                }
            }
            _ => {}
        }
    }
    Some(marker)
}

/// `#[automatically_derived]`
#[must_use]
pub fn is_automatically_derived(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident("automatically_derived"))
}

/// `#[naked]` or `#[unsafe(naked)]`: the body may only be inline assembly.
#[must_use]
pub fn is_naked(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| match &attr.meta {
        Meta::Path(path) => path.is_ident("naked"),
        Meta::List(list) if list.path.is_ident("unsafe") => list
            .parse_args::<syn::Path>()
            .is_ok_and(|inner| inner.is_ident("naked")),
        _ => false,
    })
}

fn last_segment_is(path: &syn::Path, name: &str) -> bool {
    path.segments.last().is_some_and(|segment| segment.ident == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::{parse_quote, ItemFn};

    fn marker_of(item: &ItemFn) -> Option<TimedMarker> {
        timed_marker(&item.attrs)
    }

    #[test]
    fn test_marker_forms() {
        let plain: ItemFn = parse_quote! { #[timed] fn a() { x(); } };
        let qualified: ItemFn = parse_quote! { #[metjo_probe::timed] fn a() { x(); } };
        let relative: ItemFn = parse_quote! { #[timed(relative)] fn a() { x(); } };
        let not_absolute: ItemFn = parse_quote! { #[timed(absolute = false)] fn a() { x(); } };
        let absolute: ItemFn = parse_quote! { #[timed(absolute = true)] fn a() { x(); } };
        let none: ItemFn = parse_quote! { #[inline] fn a() { x(); } };

        assert_eq!(marker_of(&plain), Some(TimedMarker::Absolute));
        assert_eq!(marker_of(&qualified), Some(TimedMarker::Absolute));
        assert_eq!(marker_of(&relative), Some(TimedMarker::Relative));
        assert_eq!(marker_of(&not_absolute), Some(TimedMarker::Relative));
        assert_eq!(marker_of(&absolute), Some(TimedMarker::Absolute));
        assert_eq!(marker_of(&none), None);
    }

    #[test]
    fn test_skip_reasons() {
        let cases: Vec<(ItemFn, Option<SkipReason>)> = vec![
            (parse_quote! { fn ok() { work(); } }, None),
            (parse_quote! { fn empty() {} }, Some(SkipReason::EmptyBody)),
            (parse_quote! { const fn c() -> u8 { 1 } }, Some(SkipReason::ConstFn)),
            (parse_quote! { async fn a() { work().await; } }, Some(SkipReason::AsyncFn)),
            (parse_quote! { unsafe fn u() { work(); } }, None),
        ];
        for (item, expected) in cases {
            assert_eq!(skip_reason(&item.sig, Some(&item.block), false), expected, "{}", item.sig.ident);
        }

        let item: ItemFn = parse_quote! { fn f() { work(); } };
        assert_eq!(skip_reason(&item.sig, None, false), Some(SkipReason::NoBody));
        assert_eq!(skip_reason(&item.sig, Some(&item.block), true), Some(SkipReason::Synthesized));
    }

    #[test]
    fn test_naked_detection() {
        let naked: ItemFn = parse_quote! { #[naked] extern "C" fn n() { asm(); } };
        let unsafe_naked: ItemFn = parse_quote! { #[unsafe(naked)] extern "C" fn n() { asm(); } };
        let regular: ItemFn = parse_quote! { #[unsafe(no_mangle)] extern "C" fn n() { work(); } };
        assert!(is_naked(&naked.attrs));
        assert!(is_naked(&unsafe_naked.attrs));
        assert!(!is_naked(&regular.attrs));
    }

    #[test]
    fn test_automatically_derived() {
        let item: syn::ItemImpl = parse_quote! {
            #[automatically_derived]
            impl Clone for Foo { fn clone(&self) -> Self { Foo } }
        };
        assert!(is_automatically_derived(&item.attrs));
    }
}
