use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields};

pub fn derive_from_variants_on(input: &DeriveInput) -> syn::Result<TokenStream> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "FromVariants can only be derived for enums",
        ));
    };

    let packet = &input.ident;
    let impls = data.variants.iter().filter_map(|variant| {
        let Fields::Unnamed(fields) = &variant.fields else {
            return None;
        };
        if fields.unnamed.len() != 1 {
            return None;
        }
        let variant_ident = &variant.ident;
        let ty = &fields.unnamed[0].ty;
        Some(quote! {
            impl ::std::convert::From<#ty> for #packet {
                fn from(value: #ty) -> Self {
                    Self::#variant_ident(value)
                }
            }
        })
    });

    Ok(quote! {
        #(#impls)*
    })
}
