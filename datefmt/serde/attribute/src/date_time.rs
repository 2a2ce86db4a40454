use proc_macro2::TokenStream;
use syn::ext::IdentExt;
use syn::parse::ParseStream;
use syn::spanned::Spanned;
use syn::{
    Attribute, Data, DeriveInput, Error, Expr, Field, Ident, LitStr, Path, Token, Type, TypePath,
    token,
};

const DATE_TIME: &[&str] = &["datefmt_serde", "date_time"];

const OPTION: [&[&str]; 2] = [&["std", "option", "Option"], &["core", "option", "Option"]];

pub(crate) fn date_time(mut input: DeriveInput) -> Result<TokenStream, Error> {
    let mut markers = Markers::new(&input.ident);
    for field in fields_mut(&mut input.data)? {
        annotate_field(field, &mut markers)?;
    }
    let markers = markers.items();
    Ok(quote::quote!(#input #(#markers)*))
}

/// Fields of a struct, or of every variant of an enum.
fn fields_mut(data: &mut Data) -> Result<Vec<&mut Field>, Error> {
    match data {
        Data::Struct(data) => Ok(data.fields.iter_mut().collect()),
        Data::Enum(data) => Ok(data
            .variants
            .iter_mut()
            .flat_map(|variant| variant.fields.iter_mut())
            .collect()),
        Data::Union(data) => Err(Error::new(
            data.union_token.span,
            "`date_time` does not support union",
        )),
    }
}

/// Generated marker types, one per annotated field.
struct Markers {
    prefix: String,
    formats: Vec<(Ident, LitStr)>,
}

impl Markers {
    fn new(ident: &Ident) -> Self {
        Self {
            prefix: ident.unraw().to_string(),
            formats: Vec::new(),
        }
    }

    fn push(&mut self, format: LitStr) -> Ident {
        let marker = quote::format_ident!(
            "__{}DateTimeFormat{}",
            self.prefix,
            self.formats.len(),
        );
        self.formats.push((marker.clone(), format));
        marker
    }

    /// Each marker implements `DateTimeFormat` with its own cell, so that a format is compiled at
    /// most once.
    fn items(&self) -> impl Iterator<Item = TokenStream> + '_ {
        self.formats.iter().map(|(marker, format)| {
            quote::quote!(
                #[doc(hidden)]
                enum #marker {}

                impl ::datefmt_serde::DateTimeFormat for #marker {
                    const FORMAT: &'static str = #format;

                    fn cell() -> &'static ::datefmt_serde::FormatCell {
                        static CELL: ::datefmt_serde::FormatCell =
                            ::datefmt_serde::FormatCell::new();
                        &CELL
                    }
                }
            )
        })
    }
}

fn annotate_field(field: &mut Field, markers: &mut Markers) -> Result<(), Error> {
    let optional = is_optional(&field.ty);
    let mut annotation = None;
    let mut format: Option<LitStr> = None;
    let mut conflict = None;

    let mut attrs = Vec::with_capacity(field.attrs.len());
    for attr in field.attrs.drain(..) {
        let Some(formats) = parse_formats(&attr)? else {
            if conflict.is_none() {
                conflict = ensure_no_conflict(&attr, optional).err();
            }
            attrs.push(attr);
            continue;
        };
        annotation.get_or_insert(attr.span());
        for lit in formats {
            if format.is_some() {
                return Err(Error::new(
                    lit.span(),
                    "duplicated `date_time(format = \"...\")`",
                ));
            }
            format = Some(lit);
        }
    }
    field.attrs = attrs;

    let Some(span) = annotation else {
        return Ok(());
    };
    let format =
        format.ok_or_else(|| Error::new(span, "missing `date_time(format = \"...\")`"))?;
    if let Some(error) = conflict {
        return Err(error);
    }
    if let Err(error) = g1_chrono::Pattern::new(&format.value()) {
        return Err(Error::new(
            format.span(),
            format!("invalid date/time format: {error}"),
        ));
    }

    let serde_with = format!("::datefmt_serde::FormatWith::<{}>", markers.push(format));
    field.attrs.push(if optional {
        syn::parse_quote!(#[serde(default, with = #serde_with)])
    } else {
        syn::parse_quote!(#[serde(with = #serde_with)])
    });
    Ok(())
}

/// Optional fields are `Option<T>`, spelled with or without its `std` or `core` path.
fn is_optional(mut type_: &Type) -> bool {
    loop {
        match type_ {
            Type::Group(group) => type_ = &group.elem,
            Type::Paren(paren) => type_ = &paren.elem,
            Type::Path(TypePath { qself: None, path }) => {
                return OPTION.iter().any(|option| match_path(path, option));
            }
            _ => return false,
        }
    }
}

/// Parses the formats of a `#[date_time(format = "...")]` attribute; returns `None` for any other
/// attribute.
fn parse_formats(attr: &Attribute) -> Result<Option<Vec<LitStr>>, Error> {
    if !match_path(attr.path(), DATE_TIME) {
        return Ok(None);
    }
    attr.parse_args_with(|input: ParseStream| {
        let mut formats = Vec::new();
        while !input.is_empty() {
            let name = input.parse::<Ident>()?;
            if name != "format" {
                return Err(Error::new(name.span(), "unknown `date_time(...)` argument"));
            }
            input.parse::<Token![=]>()?;
            formats.push(input.parse::<LitStr>()?);
            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(formats)
    })
    .map(Some)
}

/// Rejects the `serde` arguments that the generated attribute would duplicate.
fn ensure_no_conflict(attr: &Attribute, optional: bool) -> Result<(), Error> {
    if !attr.path().is_ident("serde") {
        return Ok(());
    }
    attr.parse_nested_meta(|meta| {
        // Argument values are skipped.
        if meta.input.peek(Token![=]) {
            meta.value()?.parse::<Expr>()?;
        } else if meta.input.peek(token::Paren) {
            let args;
            syn::parenthesized!(args in meta.input);
            args.parse::<TokenStream>()?;
        }

        let name = meta
            .path
            .get_ident()
            .map(Ident::to_string)
            .unwrap_or_default();
        let generated = match name.as_str() {
            "with" | "serialize_with" | "deserialize_with" => true,
            "default" => optional,
            _ => false,
        };
        if generated {
            return Err(meta.error(format!("`date_time(...)` conflict with `serde({name})`")));
        }
        Ok(())
    })
}

/// Matches `path` against the fully qualified `expect`.  A path of the last segment alone matches
/// as well, and only the last segment may carry generic arguments.
fn match_path(path: &Path, expect: &[&str]) -> bool {
    let Some((last, _)) = expect.split_last() else {
        return false;
    };
    let n = path.segments.len();
    let expect = if path.leading_colon.is_none() && n == 1 {
        std::slice::from_ref(last)
    } else {
        expect
    };
    n == expect.len()
        && path
            .segments
            .iter()
            .zip(expect)
            .enumerate()
            .all(|(i, (segment, name))| {
                segment.ident == name && (i + 1 == n || segment.arguments.is_none())
            })
}
