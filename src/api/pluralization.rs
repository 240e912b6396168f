//! Resource name pluralization for HubSpot endpoint paths

/// Lowercase and pluralize a resource type name: `Company` -> `companies`,
/// `Contact` -> `contacts`.
///
/// HubSpot object names only need the trailing-`y` rule; everything else
/// takes an `s`.
pub fn pluralize_resource_name(type_name: &str) -> String {
    let lower = type_name.to_lowercase();

    if lower.is_empty() {
        return lower;
    }

    match lower.strip_suffix('y') {
        Some(stem) => format!("{}ies", stem),
        None => format!("{}s", lower),
    }
}
