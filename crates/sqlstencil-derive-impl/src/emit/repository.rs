// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Generated repository struct.
//!
//! ```rust,ignore
//! pub struct UserRepoImpl<C: Session> {
//!     connection:      C,
//!     transaction:     Option<C::Transaction>,
//!     command_timeout: Option<Duration>,
//!     hooks:           Option<Arc<dyn ExecutionHooks>>, // feature `hooks`
//! }
//!
//! impl<C> UserRepo for UserRepoImpl<C>
//! where
//!     C: Connection + AsyncConnection, // per method flavors present
//! { ... }
//! ```
//!
//! The transaction slot has a single writer: `set_transaction` takes
//! `&mut self`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Ident, Visibility};

/// Inputs of one repository struct.
#[derive(Debug)]
pub struct Repository<'a> {
    /// Trait visibility, reused for the struct.
    pub vis: &'a Visibility,

    /// Repository trait.
    pub trait_ident: &'a Ident,

    /// Generated struct.
    pub ident: &'a Ident,

    /// Trait impl items.
    pub methods: Vec<TokenStream>,

    /// A sync method was generated.
    pub needs_sync: bool,

    /// An async method was generated.
    pub needs_async: bool,

    /// Carry an `ExecutionHooks` slot.
    pub hooks: bool
}

impl Repository<'_> {
    /// Struct, inherent impl and trait impl.
    #[must_use]
    pub fn generate(&self) -> TokenStream {
        let Self {
            vis,
            trait_ident,
            ident,
            methods,
            needs_sync,
            needs_async,
            hooks
        } = self;

        let doc = format!("Generated implementation of [`{trait_ident}`].");
        let (hooks_field, hooks_init, hooks_method) = if *hooks {
            (
                quote! { hooks: ::core::option::Option<::std::sync::Arc<dyn ::sqlstencil::hooks::ExecutionHooks>>, },
                quote! { hooks: ::core::option::Option::None, },
                quote! {
                    /// Observe every command with `hooks`.
                    #[must_use]
                    #vis fn with_hooks(mut self, hooks: ::std::sync::Arc<dyn ::sqlstencil::hooks::ExecutionHooks>) -> Self {
                        self.hooks = ::core::option::Option::Some(hooks);
                        self
                    }
                }
            )
        } else {
            (TokenStream::new(), TokenStream::new(), TokenStream::new())
        };

        let mut bounds = Vec::new();
        if *needs_sync {
            bounds.push(quote!(::sqlstencil::Connection));
        }
        if *needs_async {
            bounds.push(quote!(::sqlstencil::AsyncConnection));
        }
        let bounds = if bounds.is_empty() {
            quote!(::sqlstencil::Session)
        } else {
            quote!(#(#bounds)+*)
        };

        quote! {
            #[doc = #doc]
            #vis struct #ident<C: ::sqlstencil::Session> {
                connection: C,
                transaction: ::core::option::Option<C::Transaction>,
                command_timeout: ::core::option::Option<::core::time::Duration>,
                #hooks_field
            }

            impl<C: ::sqlstencil::Session> #ident<C> {
                /// Wrap `connection`.
                #[must_use]
                #vis fn new(connection: C) -> Self {
                    Self {
                        connection,
                        transaction: ::core::option::Option::None,
                        command_timeout: ::core::option::Option::None,
                        #hooks_init
                    }
                }

                /// Underlying connection.
                #[must_use]
                #vis fn connection(&self) -> &C {
                    &self.connection
                }

                /// Associate every subsequent command with `transaction`, or
                /// stop doing so with `None`.
                #vis fn set_transaction(&mut self, transaction: ::core::option::Option<C::Transaction>) {
                    self.transaction = transaction;
                }

                /// Current transaction.
                #[must_use]
                #vis fn transaction(&self) -> ::core::option::Option<&C::Transaction> {
                    self.transaction.as_ref()
                }

                /// Apply `timeout` to every command.
                #[must_use]
                #vis fn with_command_timeout(mut self, timeout: ::core::time::Duration) -> Self {
                    self.command_timeout = ::core::option::Option::Some(timeout);
                    self
                }

                #hooks_method
            }

            impl<C> #trait_ident for #ident<C>
            where
                C: #bounds
            {
                #(#methods)*
            }
        }
    }
}
