// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! `#[schema]` orchestration.
//!
//! One macro invocation compiles one inline module:
//!
//! ```text
//! mod db { #[entity] struct …; #[repository] trait …; }
//!          │                     │
//!          │ extract (cached)    │ per method:
//!          ▼                     ▼
//!   Entity impl + Column    parse → resolve → rewrite → emit
//!   consts                        │
//!                                 ▼ findings → compile_error! / warnings
//!   {Trait}Impl<C> struct + trait impl appended to the module
//! ```
//!
//! A failing method gets a `compile_error!` body; the other methods of the
//! same trait are generated normally.

pub mod args;

#[cfg(test)]
mod tests;

use darling::{FromAttributes, FromMeta, ast::NestedMeta};
use proc_macro2::TokenStream;
use quote::{ToTokens, format_ident, quote};
use syn::{Attribute, Item, ItemMod, ItemStruct, ItemTrait, TraitItem, TraitItemFn};

use self::args::{DEFAULT_BATCH_SIZE, RepositoryArgs, SchemaArgs};
use crate::{
    diagnostics::{Anchor, Diagnostics},
    emit::{
        self, Emitter,
        findings::{self, Spans},
        repository::Repository
    },
    entity::{self, EntityCache, EntityDescriptor},
    method::{self, MethodSpec},
    resolve::{Context, resolve},
    rewrite::rewrite,
    template
};

/// Expand `#[schema(args)]` applied to `input`.
#[must_use]
pub fn expand(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut module: ItemMod = match syn::parse2(input) {
        Ok(module) => module,
        Err(error) => return error.to_compile_error()
    };
    let args = match NestedMeta::parse_meta_list(args)
        .map_err(darling::Error::from)
        .and_then(|items| SchemaArgs::from_list(&items))
    {
        Ok(args) => args,
        Err(error) => {
            let errors = error.write_errors();
            return quote! { #module #errors };
        }
    };
    match compile(&args, &mut module) {
        Ok(()) => module.to_token_stream(),
        Err(error) => {
            let errors = error.write_errors();
            quote! { #module #errors }
        }
    }
}

/// Compile every entity and repository of `module` in place.
///
/// # Errors
///
/// Malformed attributes, accumulated across the whole module. The module is
/// still rewritten as far as possible.
pub fn compile(args: &SchemaArgs, module: &mut ItemMod) -> darling::Result<()> {
    let Some((_, items)) = &mut module.content else {
        return Err(darling::Error::custom("`#[schema]` needs an inline module: `mod name { ... }`")
            .with_span(&module.ident));
    };
    let mut errors = darling::Error::accumulator();
    let mut cache = EntityCache::default();
    let mut generated: Vec<TokenStream> = Vec::new();

    let entities: Vec<ItemStruct> = items
        .iter()
        .filter_map(|item| match item {
            Item::Struct(item) if has_attribute(&item.attrs, "entity") => Some(item.clone()),
            _ => None
        })
        .collect();

    for item in &entities {
        let sink = Diagnostics::new();
        let descriptor = errors.handle(cache.get_or_extract(item, args.dialect.0, args.key_policy.0, &sink));
        let spans = Spans {
            method: None,
            entity: descriptor.as_deref(),
            item:   item.ident.span()
        };
        let rendered = findings::render(&sink.into_vec(), &spans);
        generated.extend(rendered.errors);
        generated.extend(rendered.warnings);
        if let Some(descriptor) = descriptor {
            generated.push(emit::entity::generate(&descriptor, &item.vis));
        }
    }

    for item in items.iter() {
        if let Item::Trait(item) = item
            && has_attribute(&item.attrs, "repository")
            && let Some(tokens) = errors.handle(repository(item, &entities, args, &mut cache))
        {
            generated.push(tokens);
        }
    }

    for item in items.iter_mut() {
        match item {
            Item::Struct(item) if has_attribute(&item.attrs, "entity") => entity::strip_attributes(item),
            Item::Trait(item) if has_attribute(&item.attrs, "repository") => {
                item.attrs.retain(|attr| !attr.path().is_ident("repository"));
                for member in &mut item.items {
                    if let TraitItem::Fn(function) = member {
                        method::strip_attributes(function);
                    }
                }
            }
            _ => {}
        }
    }
    items.extend(generated.into_iter().map(Item::Verbatim));
    errors.finish()
}

/// Repository struct and trait impl for one `#[repository]` trait.
fn repository(
    item: &ItemTrait,
    entities: &[ItemStruct],
    args: &SchemaArgs,
    cache: &mut EntityCache
) -> darling::Result<TokenStream> {
    let repo = RepositoryArgs::from_attributes(&item.attrs)?;
    let dialect = repo.dialect.map_or(args.dialect.0, |d| d.0);

    let Some(entity_item) = entities.iter().find(|e| e.ident == repo.entity.0) else {
        let sink = Diagnostics::new();
        sink.error(
            "ENTITY-UNKNOWN",
            Anchor::Repository,
            format!(
                "`{}` is not an `#[entity]` struct of this schema module",
                repo.entity.0
            )
        );
        let spans = Spans {
            method: None,
            entity: None,
            item:   repo.entity.0.span()
        };
        let rendered = findings::render(&sink.into_vec(), &spans);
        let errors = rendered.errors;
        return Ok(quote! { #(#errors)* });
    };

    let entity_sink = Diagnostics::new();
    let descriptor = cache.get_or_extract(entity_item, dialect, args.key_policy.0, &entity_sink)?;
    let entity: &EntityDescriptor = &descriptor;
    let entity_findings = findings::render(
        &entity_sink.into_vec(),
        &Spans {
            method: None,
            entity: Some(entity),
            item:   entity_item.ident.span()
        }
    );

    let ident = repo
        .name
        .clone()
        .unwrap_or_else(|| format_ident!("{}Impl", item.ident));
    let repository_name = ident.to_string();
    let batch_size = repo
        .batch_size
        .or(args.batch_size)
        .unwrap_or(DEFAULT_BATCH_SIZE);
    let site = Site {
        entity,
        args,
        repository: &repository_name,
        batch_size,
        trait_span: item.ident.span()
    };

    let mut errors = darling::Error::accumulator();
    let mut methods = Vec::new();
    let mut warnings = Vec::new();
    let mut needs_sync = false;
    let mut needs_async = false;
    for member in &item.items {
        let TraitItem::Fn(function) = member else {
            continue;
        };
        let Some(Some(compiled)) = errors.handle(site.method(function)) else {
            continue;
        };
        warnings.extend(compiled.warnings);
        if compiled.generated {
            if function.sig.asyncness.is_some() {
                needs_async = true;
            } else {
                needs_sync = true;
            }
        }
        methods.push(compiled.item);
    }
    errors.finish()?;

    let generated = Repository {
        vis: &item.vis,
        trait_ident: &item.ident,
        ident: &ident,
        methods,
        needs_sync,
        needs_async,
        hooks: cfg!(feature = "hooks")
    }
    .generate();
    let entity_errors = entity_findings.errors;
    let entity_warnings = entity_findings.warnings;
    Ok(quote! {
        #(#entity_errors)*
        #(#entity_warnings)*
        #generated
        #(#warnings)*
    })
}

/// Shared inputs of every method of one repository.
struct Site<'a> {
    entity:     &'a EntityDescriptor,
    args:       &'a SchemaArgs,
    repository: &'a str,
    batch_size: usize,
    trait_span: proc_macro2::Span
}

/// Output for one trait method.
struct CompiledMethod {
    item:      TokenStream,
    warnings:  Vec<TokenStream>,
    generated: bool
}

impl Site<'_> {
    /// `None` for methods left to their default body.
    fn method(&self, function: &TraitItemFn) -> darling::Result<Option<CompiledMethod>> {
        let sink = Diagnostics::new();
        let spec = MethodSpec::parse(function, &self.entity.ident, &sink)?;
        let mut stripped = function.clone();
        method::strip_attributes(&mut stripped);
        let sig = &stripped.sig;

        let plan = match &spec.template {
            None if spec.has_default => return Ok(None),
            None => {
                sink.error(
                    "SQL-MISSING",
                    Anchor::Method,
                    format!(
                        "`{}` has neither `#[sql(\"...\")]` nor a default body",
                        spec.name()
                    )
                );
                None
            }
            Some(template) => match template::parse(&template.value(), &self.args.delimiters()) {
                Err(error) => {
                    sink.error(
                        error.code(),
                        Anchor::Template {
                            offset: error.offset,
                            text:   error.text.clone()
                        },
                        error.to_string()
                    );
                    None
                }
                Ok(nodes) => {
                    let cx = Context {
                        entity:     self.entity,
                        method:     &spec,
                        batch_size: self.batch_size
                    };
                    let mut plan = resolve(&nodes, &cx, &sink);
                    if !sink.has_errors() {
                        rewrite(&mut plan, &cx, &sink);
                    }
                    Some(plan)
                }
            }
        };

        let spans = Spans {
            method: Some(&spec),
            entity: Some(self.entity),
            item:   self.trait_span
        };
        let rendered = findings::render(&sink.into_vec(), &spans);
        let plan = match plan {
            Some(plan) if !rendered.has_errors() => plan,
            _ => {
                return Ok(Some(CompiledMethod {
                    item:      findings::failed_method(sig, &rendered.errors),
                    warnings:  rendered.warnings,
                    generated: false
                }));
            }
        };

        let emitter = Emitter {
            method:     &spec,
            plan:       &plan,
            entity:     self.entity,
            repository: self.repository,
            hooks:      cfg!(feature = "hooks")
        };
        Ok(Some(CompiledMethod {
            item:      emitter.method(sig),
            warnings:  rendered.warnings,
            generated: true
        }))
    }
}

fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
