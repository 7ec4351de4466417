//! Reverse geocoding adapters.
//!
//! A thin HTTP implementation of the `ReverseGeocoder` port against a
//! Nominatim-compatible `/reverse` endpoint.

mod dto;
mod nominatim;

pub use nominatim::NominatimGeocoder;
