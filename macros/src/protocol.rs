//! Derives for the `Encode` and `Decode` traits in `crate::protocol`.
//!
//! Structs encode their named fields in declaration order. Enums are
//! packet sets: a varint packet ID followed by the body of the variant.

use darling::{FromDeriveInput, FromField, FromMeta, FromVariant};
use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use syn::{Data, DataEnum, DataStruct, DeriveInput, Fields};

/// `#[encoding(...)]` options on a field.
#[derive(Default, Debug, FromField)]
#[darling(attributes(encoding))]
#[darling(default)]
struct FieldOptions {
    /// Write the integer as a VarInt instead of fixed width.
    varint: bool,
}

#[derive(Debug, FromDeriveInput)]
#[darling(attributes(encoding))]
struct EnumOptions {
    discriminant: Discriminant,
}

#[derive(Debug, FromMeta)]
enum Discriminant {
    #[darling(rename = "varint")]
    VarInt,
}

#[derive(Debug, FromVariant)]
#[darling(attributes(encoding))]
struct VariantOptions {
    id: i32,
}

#[derive(Debug)]
struct FieldInput {
    ident: Ident,
    /// Expression yielding the field value inside `encode`.
    access: TokenStream,
    options: FieldOptions,
}

#[derive(Debug)]
struct VariantInput {
    ident: Ident,
    id: i32,
    field: Option<FieldInput>,
}

#[derive(Debug)]
enum Input {
    Struct(Vec<FieldInput>),
    Enum(Vec<VariantInput>),
}

fn parse_input(input: &DeriveInput) -> syn::Result<Input> {
    match &input.data {
        Data::Struct(data) => parse_struct(data).map(Input::Struct),
        Data::Enum(data) => parse_enum(data, input).map(Input::Enum),
        Data::Union(data) => Err(syn::Error::new_spanned(
            data.union_token,
            "packets cannot be unions",
        )),
    }
}

fn parse_struct(data: &DataStruct) -> syn::Result<Vec<FieldInput>> {
    match &data.fields {
        Fields::Named(named) => named
            .named
            .iter()
            .map(|field| {
                let ident = field
                    .ident
                    .clone()
                    .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
                Ok(FieldInput {
                    access: quote! { self.#ident },
                    options: FieldOptions::from_field(field)?,
                    ident,
                })
            })
            .collect(),
        Fields::Unnamed(unnamed) => Err(syn::Error::new_spanned(
            unnamed,
            "tuple structs are not supported as packets",
        )),
        Fields::Unit => Ok(Vec::new()),
    }
}

fn parse_enum(data: &DataEnum, input: &DeriveInput) -> syn::Result<Vec<VariantInput>> {
    let EnumOptions { discriminant } = EnumOptions::from_derive_input(input)?;
    let Discriminant::VarInt = discriminant;

    data.variants
        .iter()
        .map(|variant| {
            let VariantOptions { id } = VariantOptions::from_variant(variant)?;
            let field = match &variant.fields {
                Fields::Unit => None,
                Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
                    let ident = Ident::new("__body", Span::call_site());
                    Some(FieldInput {
                        access: quote! { (*#ident) },
                        options: FieldOptions::from_field(&unnamed.unnamed[0])?,
                        ident,
                    })
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "packet variants must be unit or hold exactly one body type",
                    ))
                }
            };
            Ok(VariantInput {
                ident: variant.ident.clone(),
                id,
                field,
            })
        })
        .collect()
}

fn encode_field(field: &FieldInput) -> TokenStream {
    let FieldInput {
        access, options, ..
    } = field;

    if options.varint {
        quote! {
            encoder.write_var_int(#access.try_into().unwrap_or(i32::MAX));
        }
    } else {
        quote! {
            crate::protocol::Encode::encode(&#access, encoder);
        }
    }
}

fn decode_field(field: &FieldInput) -> TokenStream {
    let FieldInput { ident, options, .. } = field;

    if options.varint {
        quote! {
            let #ident = decoder.read_var_int()?.try_into()?;
        }
    } else {
        quote! {
            let #ident = crate::protocol::Decode::decode(decoder)?;
        }
    }
}

fn encode_body(input: &Input) -> syn::Result<TokenStream> {
    match input {
        Input::Struct(fields) => {
            let fields = fields.iter().map(encode_field);
            Ok(quote! { #(#fields)* })
        }
        Input::Enum(variants) => {
            let arms = variants
                .iter()
                .map(|variant| {
                    let VariantInput { ident, id, field } = variant;
                    let (pattern, body) = match field {
                        Some(field) => {
                            let binding = &field.ident;
                            (quote! { Self::#ident(#binding) }, encode_field(field))
                        }
                        None => (quote! { Self::#ident }, quote! {}),
                    };
                    Ok(quote! {
                        #pattern => {
                            encoder.write_var_int(#id);
                            #body
                        }
                    })
                })
                .collect::<syn::Result<Vec<_>>>()?;
            Ok(quote! {
                match self {
                    #(#arms)*
                }
            })
        }
    }
}

fn decode_body(input: &Input) -> TokenStream {
    match input {
        Input::Struct(fields) => {
            let decode = fields.iter().map(decode_field);
            let idents = fields.iter().map(|field| &field.ident);
            quote! {
                #(#decode)*
                Ok(Self { #(#idents,)* })
            }
        }
        Input::Enum(variants) => {
            let arms = variants.iter().map(|variant| {
                let VariantInput { ident, id, field } = variant;
                match field {
                    Some(field) => {
                        let decode = decode_field(field);
                        let binding = &field.ident;
                        quote! {
                            #id => {
                                #decode
                                Ok(Self::#ident(#binding))
                            }
                        }
                    }
                    None => quote! {
                        #id => Ok(Self::#ident),
                    },
                }
            });
            quote! {
                let packet_id = decoder.read_var_int()?;
                match packet_id {
                    #(#arms)*
                    unknown => Err(crate::protocol::DecodeError::UnknownPacketId(unknown)),
                }
            }
        }
    }
}

pub fn derive_encode_on(derive_input: &DeriveInput) -> syn::Result<TokenStream> {
    let input = parse_input(derive_input)?;
    let ident = &derive_input.ident;
    let body = encode_body(&input)?;
    Ok(quote! {
        impl crate::protocol::Encode for #ident {
            #[allow(unused_variables)]
            fn encode(&self, encoder: &mut crate::protocol::Encoder) {
                #body
            }
        }
    })
}

pub fn derive_decode_on(derive_input: &DeriveInput) -> syn::Result<TokenStream> {
    let input = parse_input(derive_input)?;
    let ident = &derive_input.ident;
    let body = decode_body(&input);
    Ok(quote! {
        impl crate::protocol::Decode for #ident {
            #[allow(unused_variables)]
            fn decode(
                decoder: &mut crate::protocol::Decoder,
            ) -> ::std::result::Result<Self, crate::protocol::DecodeError> {
                #body
            }
        }
    })
}
