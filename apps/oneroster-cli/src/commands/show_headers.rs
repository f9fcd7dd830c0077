use crate::error::CliResult;
use oneroster_csvs::Entity;

/// Print the header line an entity file must start with
pub fn execute(entity: Entity) -> CliResult<()> {
    let schema = entity.schema();
    println!("{}", schema.headers().join(","));

    if schema.allow_extra_fields {
        eprintln!(
            "# extra columns allowed with prefix '{}'",
            schema.extra_field_prefix
        );
    }
    Ok(())
}
