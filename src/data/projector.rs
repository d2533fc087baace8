//! Projection of raw upstream records onto the public record shape

use super::{ProjectedRecord, RawRecord};

const NAME_PATH: &[&str] = &["name"];
const LOCATION_NAME_PATH: &[&str] = &["location", "name"];
const IMAGE_PATH: &[&str] = &["image"];

/// Maps one raw record to a `ProjectedRecord`
///
/// Returns `None` when the name, the nested location name, or the image is
/// missing, empty, or not a string. Dropping a record is not an error.
pub fn project(raw: &RawRecord) -> Option<ProjectedRecord> {
    let character_name = raw.str_at(NAME_PATH)?;
    let location_name = raw.str_at(LOCATION_NAME_PATH)?;
    let avatar_url = raw.str_at(IMAGE_PATH)?;

    Some(ProjectedRecord {
        character_name: character_name.to_string(),
        location_name: location_name.to_string(),
        avatar_url: avatar_url.to_string(),
    })
}
