use proc_macro::TokenStream;
use proc_macro2::Span;

///
/// Turn an async test into one that runs against a freshly spawned panel.
///
/// The test body gets an `app` binding. Supported arguments:
///
/// * `strategy`: a variant of `crate::helpers::BootstrapType` used to seed the store.
/// * `daemon`: a variant of `crate::helpers::DaemonBehaviour` for the mocked daemon.
///
/// Expectations mounted on the mocked daemon are verified after the body ran.
///
#[proc_macro_attribute]
pub fn test(args: TokenStream, item: TokenStream) -> TokenStream {
    let mut input = syn::parse_macro_input!(item as syn::ItemFn);
    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &mut input.sig;
    let body = &input.block;

    let args = syn::parse_macro_input!(args as syn::AttributeArgs);
    let mut strategy = None;
    let mut daemon = None;

    for arg in &args {
        match arg {
            syn::NestedMeta::Meta(syn::Meta::NameValue(syn::MetaNameValue {
                lit: syn::Lit::Str(lit),
                path,
                ..
            })) => match path
                .get_ident()
                .map(|i| i.to_string().to_lowercase())
                .as_deref()
            {
                Some("strategy") => strategy = Some(lit.value()),
                Some("daemon") => daemon = Some(lit.value()),
                _ => {
                    return syn::Error::new_spanned(arg, "Unknown argument specified")
                        .to_compile_error()
                        .into()
                }
            },
            _ => {
                return syn::Error::new_spanned(arg, "Unknown argument specified")
                    .to_compile_error()
                    .into()
            }
        }
    }

    let strategy = match helper_variant("BootstrapType", strategy, "Default") {
        Ok(strategy) => strategy,
        Err(e) => return e.to_compile_error().into(),
    };
    let daemon = match helper_variant("DaemonBehaviour", daemon, "Healthy") {
        Ok(daemon) => daemon,
        Err(e) => return e.to_compile_error().into(),
    };

    sig.asyncness = None;

    (quote::quote_spanned! {Span::call_site()=>
        #[test]
        #(#attrs)*
        #vis #sig {
            actix_rt::System::new()
                .block_on(async {
                    let app = crate::helpers::spawn_app(#strategy, #daemon).await;

                    #body

                    app.daemon_server.verify().await;
                })
        }
    })
    .into()
}

fn helper_variant(
    helper: &str,
    variant: Option<String>,
    default: &str,
) -> Result<syn::Expr, syn::Error> {
    syn::parse_str::<syn::Expr>(&format!(
        "crate::helpers::{}::{}",
        helper,
        variant.unwrap_or_else(|| default.to_string())
    ))
}
