// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Command lifecycle.
//!
//! ```text
//! cancellation check → create_command → set_text / parameters
//!   → timeout, transaction → [before_execute] → execute
//!   → [after_execute | on_failure] → ?
//! ```
//!
//! Sync methods name the sync driver traits only, `async fn` methods the
//! async ones only.

use proc_macro2::TokenStream;
use quote::quote;

use super::{Emitter, statement::Prepared};

/// Sync or async driver family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flavor {
    /// `async fn` method.
    pub is_async: bool
}

impl Flavor {
    /// Connection trait path.
    #[must_use]
    pub fn connection(self) -> TokenStream {
        if self.is_async {
            quote!(::sqlstencil::AsyncConnection)
        } else {
            quote!(::sqlstencil::Connection)
        }
    }

    /// Command trait path.
    #[must_use]
    pub fn command(self) -> TokenStream {
        if self.is_async {
            quote!(::sqlstencil::AsyncCommand)
        } else {
            quote!(::sqlstencil::Command)
        }
    }

    /// Cursor trait path.
    #[must_use]
    pub fn cursor(self) -> TokenStream {
        if self.is_async {
            quote!(::sqlstencil::AsyncRowCursor)
        } else {
            quote!(::sqlstencil::RowCursor)
        }
    }

    /// `.await` for async calls.
    #[must_use]
    pub fn wait(self) -> TokenStream {
        if self.is_async {
            quote!(.await)
        } else {
            TokenStream::new()
        }
    }
}

/// How a command is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Execute {
    NonQuery,
    Scalar,
    Reader
}

impl Emitter<'_> {
    /// Block evaluating to the execution result of `prepared`.
    pub(super) fn run(&self, prepared: &Prepared, execute: Execute) -> TokenStream {
        let flavor = self.flavor();
        let connection = flavor.connection();
        let command = flavor.command();
        let wait = flavor.wait();
        let Prepared {
            setup,
            text,
            count,
            attach
        } = prepared;

        let call = match execute {
            Execute::NonQuery => quote!(execute_non_query),
            Execute::Scalar => quote!(execute_scalar),
            Execute::Reader => quote!(execute_reader)
        };
        let cancel = self.cancel_check();
        let execution = if self.hooks {
            let repository = self.repository;
            let method = self.method.name();
            let rows = match execute {
                Execute::NonQuery => quote!(::core::option::Option::Some(*__value)),
                Execute::Scalar | Execute::Reader => quote!(::core::option::Option::None)
            };
            quote! {
                let __context = ::sqlstencil::hooks::ExecutionContext {
                    repository: #repository,
                    method:     #method,
                    sql:        #text,
                    parameters: #count
                };
                if let ::core::option::Option::Some(__hooks) = &self.hooks {
                    __hooks.before_execute(&__context);
                }
                let __outcome = #command::#call(&mut __command)#wait;
                if let ::core::option::Option::Some(__hooks) = &self.hooks {
                    match &__outcome {
                        ::core::result::Result::Ok(__value) => __hooks.after_execute(&__context, #rows),
                        ::core::result::Result::Err(__error) => __hooks.on_failure(&__context, __error)
                    }
                }
                __outcome?
            }
        } else {
            quote! { #command::#call(&mut __command)#wait? }
        };

        quote! {{
            #setup
            #cancel
            let mut __command = #connection::create_command(&self.connection)?;
            #attach
            if let ::core::option::Option::Some(__timeout) = self.command_timeout {
                #command::set_timeout(&mut __command, __timeout);
            }
            if let ::core::option::Option::Some(__transaction) = &self.transaction {
                #command::set_transaction(&mut __command, __transaction);
            }
            #execution
        }}
    }

    /// Fail with `Error::Cancelled` once the token fired.
    pub(super) fn cancel_check(&self) -> TokenStream {
        let Some(token) = self.method.cancellation() else {
            return TokenStream::new();
        };
        let token = &token.ident;
        quote! {
            if #token.is_cancelled() {
                return ::core::result::Result::Err(::sqlstencil::Error::Cancelled);
            }
        }
    }

    /// `advance()` on `__cursor`, propagating failures.
    pub(super) fn advance(&self) -> TokenStream {
        let flavor = self.flavor();
        let cursor = flavor.cursor();
        let wait = flavor.wait();
        quote!(#cursor::advance(&mut __cursor)#wait?)
    }
}
