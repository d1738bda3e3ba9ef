/// Short annotation shown next to a locality, if one exists.
pub fn locality_note(locality: &str) -> Option<&'static str> {
    match locality {
        "New York" => Some("Includes Manhattan and Brooklyn"),
        "Yonkers" => Some("Known for affordable options"),
        "Albany" => Some("New York State's capital with diverse housing"),
        "Bronx County" => Some("Offers a mix of condos and co-ops at various prices"),
        _ => None,
    }
}
