//! `key = value` attribute lists.

use syn::{
    Expr, Ident, LitStr, Token,
    parse::{Parse, ParseStream},
};

/// One `key = value` pair.
pub(crate) struct AttrPair {
    pub key: Ident,
    pub value: Expr,
}

/// A comma separated list of `key = value` pairs.
pub(crate) struct AttrList {
    pub pairs: Vec<AttrPair>,
}

impl Parse for AttrList {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut pairs = Vec::new();

        while !input.is_empty() {
            let key: Ident = input.parse()?;
            input.parse::<Token![=]>()?;
            let value: Expr = input.parse()?;
            pairs.push(AttrPair { key, value });

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(AttrList { pairs })
    }
}

impl AttrPair {
    /// The value as a string literal.
    pub fn lit_str(&self) -> syn::Result<LitStr> {
        match &self.value {
            Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(lit),
                ..
            }) => Ok(lit.clone()),
            other => Err(syn::Error::new_spanned(
                other,
                format!("`{}` expects a string literal", self.key),
            )),
        }
    }
}
