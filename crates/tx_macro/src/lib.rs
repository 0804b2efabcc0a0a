extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn, PatType};

/// Runs the body of an async method inside a store transaction.
///
/// The method must take a `session: &mut impl storage::Transaction` argument
/// and return a `Result` whose error converts from `eyre::Error`. The
/// transaction is committed when the body returns `Ok` and aborted otherwise.
#[proc_macro_attribute]
pub fn tx(_args: TokenStream, input: TokenStream) -> TokenStream {
    let input_fn = parse_macro_input!(input as ItemFn);
    let attrs = &input_fn.attrs;
    let vis = &input_fn.vis;
    let block = &input_fn.block;
    let fn_name = &input_fn.sig.ident;
    let generics = &input_fn.sig.generics;
    let where_clause = &input_fn.sig.generics.where_clause;
    let fn_args = &input_fn.sig.inputs;
    let fn_return = &input_fn.sig.output;

    let arg_list: Vec<_> = fn_args
        .iter()
        .map(|arg| match arg {
            FnArg::Typed(PatType { pat, .. }) => quote! { #pat },
            FnArg::Receiver(_) => quote! { self },
        })
        .collect();

    let wrapped_fn_name = quote::format_ident!("{}_inner", fn_name);
    let gen = quote! {
        async fn #wrapped_fn_name #generics (#fn_args) #fn_return #where_clause {
            #block
        }

        #(#attrs)*
        #vis async fn #fn_name #generics (#fn_args) #fn_return #where_clause {
            storage::Transaction::start_transaction(&mut *session).await?;
            match Self::#wrapped_fn_name(#(#arg_list),*).await {
                Ok(result) => {
                    storage::Transaction::commit_transaction(&mut *session).await?;
                    Ok(result)
                },
                Err(e) => {
                    if let Err(abort) = storage::Transaction::abort_transaction(&mut *session).await {
                        log::error!("Failed to abort transaction: {:#}", abort);
                    }
                    Err(e)
                }
            }
        }
    };

    TokenStream::from(gen)
}
