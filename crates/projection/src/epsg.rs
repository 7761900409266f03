//! EPSG code lookup against the crs-definitions database.

/// PROJ string for an EPSG code, `None` when the database has no entry.
pub fn proj_string(code: u32) -> Option<&'static str> {
    u16::try_from(code)
        .ok()
        .and_then(crs_definitions::from_code)
        .map(|def| def.proj4)
}
