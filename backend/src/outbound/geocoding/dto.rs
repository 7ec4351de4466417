//! DTOs for decoding Nominatim reverse lookups.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub(super) struct ReverseResponseDto {
    pub(super) display_name: Option<String>,
    pub(super) address: Option<AddressDto>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct AddressDto {
    house_number: Option<String>,
    road: Option<String>,
    suburb: Option<String>,
    neighbourhood: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    country: Option<String>,
}

impl AddressDto {
    /// Compact "number, road, district, locality, country" rendering.
    fn compose(&self) -> Option<String> {
        let parts: Vec<&str> = [
            self.house_number.as_deref(),
            self.road.as_deref(),
            self.suburb.as_deref().or(self.neighbourhood.as_deref()),
            self.city
                .as_deref()
                .or(self.town.as_deref())
                .or(self.village.as_deref()),
            self.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

impl ReverseResponseDto {
    /// Prefer the structured address; fall back to the display name.
    pub(super) fn into_address(self) -> Option<String> {
        self.address
            .as_ref()
            .and_then(AddressDto::compose)
            .or_else(|| {
                self.display_name
                    .map(|name| name.trim().to_owned())
                    .filter(|name| !name.is_empty())
            })
    }
}
