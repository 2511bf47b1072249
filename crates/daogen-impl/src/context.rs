// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Generation context.
//!
//! One [`Context`] lives for one generation pass. It carries the model, the
//! resolved names and the helper [`Registry`], so independent passes never
//! share state.

use quote::format_ident;
use syn::Ident;

use crate::{Options, model::InterfaceModel, registry::Registry};

/// State of one generation pass.
///
/// # Fields
///
/// | Field | Description |
/// |-------|-------------|
/// | `model` | Interface being implemented |
/// | `runtime` | Path of the runtime crate in generated code |
/// | `trait_name` | Implemented trait (e.g., `UserDao`) |
/// | `impl_name` | Generated type (e.g., `UserDaoImpl`) |
/// | `registry` | Shared helpers discovered so far |
pub struct Context<'a> {
    /// Interface being implemented.
    pub model: &'a InterfaceModel,

    /// Runtime crate path.
    pub runtime: syn::Path,

    /// Implemented trait.
    pub trait_name: &'a Ident,

    /// Generated type name.
    pub impl_name: Ident,

    /// Shared helpers.
    pub registry: Registry
}

impl<'a> Context<'a> {
    /// Start a pass over `model`.
    pub fn new(model: &'a InterfaceModel, options: &Options) -> Self {
        Self {
            model,
            runtime: options.runtime.clone(),
            trait_name: &model.name,
            impl_name: format_ident!("{}{}", model.name, options.impl_suffix),
            registry: Registry::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impl_name_uses_suffix() {
        let model = InterfaceModel::new("UserDao");
        let ctx = Context::new(&model, &Options::default());
        assert_eq!(ctx.impl_name, "UserDaoImpl");

        let options = Options {
            impl_suffix: "Generated".into(),
            ..Options::default()
        };
        assert_eq!(Context::new(&model, &options).impl_name, "UserDaoGenerated");
    }
}
