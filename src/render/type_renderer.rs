use crate::{
    analyzer::{DescribedColumn, DescribedType},
    config::{GenerateOptions, RenderOptions},
    render::property_key,
};

/// TypeScript text of a described type.
pub fn render_type(ty: &DescribedType, options: &RenderOptions) -> String {
    match ty {
        DescribedType::Type { value, .. } if value == "null" && options.null_as_undefined => "undefined".to_string(),
        DescribedType::Type { value, .. } => value.clone(),
        DescribedType::Literal { value, .. } => value.clone(),
        DescribedType::Union(members) => {
            let members: Vec<String> = members.iter().map(|member| render_type(member, options)).collect();
            members.join(" | ")
        }
        DescribedType::Array(element) => match element.as_ref() {
            DescribedType::Union(_) => format!("({})[]", render_type(element, options)),
            _ => format!("{}[]", render_type(element, options)),
        },
        DescribedType::Object(fields) => {
            render_fields(fields.iter().map(|(name, ty)| (name.clone(), ty)), options)
        }
    }
}

/// The row object of a statement's output, with the field transform applied
/// to its top-level keys.
pub fn render_row(columns: &[DescribedColumn], options: &GenerateOptions) -> String {
    let fields = columns.iter().map(|column| {
        let name = match options.field_transform {
            Some(transform) => transform.apply(&column.name),
            None => column.name.clone(),
        };
        (name, &column.ty)
    });
    render_fields(fields, &options.render_options())
}

fn render_fields<'a>(fields: impl Iterator<Item = (String, &'a DescribedType)>, options: &RenderOptions) -> String {
    let rendered: Vec<String> = fields
        .map(|(name, ty)| {
            let optional = options.null_as_optional && ty.is_nullable();
            format!("{}{}: {}", property_key(&name), if optional { "?" } else { "" }, render_type(ty, options))
        })
        .collect();

    if rendered.is_empty() { "{}".to_string() } else { format!("{{ {} }}", rendered.join("; ")) }
}
