//! # Address Translation
//!
//! Mapping between the payment APIs' contact/address shapes and the domain
//! shipping address. The street split is lossy (leading number and first
//! street token, remainder dropped) and the translated address is
//! best-effort; the authoritative address is whatever the cart service
//! stores after recalculation.

use serde::{Deserialize, Serialize};

/// Fallback country code when the sheet omits one
pub const DEFAULT_COUNTRY: &str = "US";

/// Local dialing prefix stripped from sheet-provided phone numbers
pub const LOCAL_PHONE_PREFIX: &str = "+1";

/// Domain shipping address as stored by the cart service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub city: String,
    pub country: String,
    pub postal_code: String,
    pub state: String,
    pub street_name: String,
    pub street_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Contact shape used by the native session API for shipping/billing
/// contacts. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentContact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administrative_area: Option<String>,
    /// First line is "{number} {street}", optional second line is the
    /// apartment/unit
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address_lines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
}

/// Address shape delivered by the request API's shippingaddresschange
/// surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAddress {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address_line: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependent_locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorting_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Split a street line into (number, name) on the first two space-separated
/// tokens. `"123 Main St"` yields `("123", "Main")`; the remainder is
/// dropped. Deterministic and lossy.
pub fn split_street_line(line: &str) -> (String, String) {
    let mut parts = line.split(' ');
    let number = parts.next().unwrap_or("").to_string();
    let name = parts.next().unwrap_or("").to_string();
    (number, name)
}

fn strip_phone_prefix(phone: &str) -> String {
    phone
        .strip_prefix(LOCAL_PHONE_PREFIX)
        .unwrap_or(phone)
        .to_string()
}

/// Translate a native-session contact into a domain shipping address.
///
/// Missing fields default to empty strings; the country falls back to
/// [`DEFAULT_COUNTRY`]. Round-tripping through [`address_to_contact`] is not
/// guaranteed.
pub fn contact_to_address(contact: &PaymentContact) -> ShippingAddress {
    let first_line = contact
        .address_lines
        .first()
        .map(String::as_str)
        .unwrap_or("");
    let (street_number, street_name) = split_street_line(first_line);

    ShippingAddress {
        city: contact.locality.clone().unwrap_or_default(),
        country: contact
            .country_code
            .clone()
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        postal_code: contact.postal_code.clone().unwrap_or_default(),
        state: contact.administrative_area.clone().unwrap_or_default(),
        street_name,
        street_number,
        apartment: contact.address_lines.get(1).cloned(),
        email: contact.email_address.clone().unwrap_or_default(),
        phone: strip_phone_prefix(contact.phone_number.as_deref().unwrap_or("")),
        first_name: contact.given_name.clone().unwrap_or_default(),
        last_name: contact.family_name.clone().unwrap_or_default(),
    }
}

/// Translate a domain shipping address back into a native-session contact,
/// rebuilding line one as "{number} {street}".
pub fn address_to_contact(address: &ShippingAddress) -> PaymentContact {
    let mut address_lines = vec![format!(
        "{} {}",
        address.street_number, address.street_name
    )];
    if let Some(apartment) = &address.apartment {
        address_lines.push(apartment.clone());
    }

    PaymentContact {
        locality: Some(address.city.clone()),
        country_code: Some(address.country.clone()),
        postal_code: Some(address.postal_code.clone()),
        administrative_area: Some(address.state.clone()),
        address_lines,
        email_address: Some(address.email.clone()),
        phone_number: Some(address.phone.clone()),
        given_name: Some(address.first_name.clone()),
        family_name: Some(address.last_name.clone()),
    }
}

/// Translate a request-API address into a domain shipping address.
///
/// The request surface carries no name split, so first/last name come back
/// empty; the city is taken from the dependent locality as the cart service
/// expects for this surface.
pub fn payment_address_to_address(address: &PaymentAddress) -> ShippingAddress {
    let first_line = address
        .address_line
        .first()
        .map(String::as_str)
        .unwrap_or("");
    let (street_number, street_name) = split_street_line(first_line);

    ShippingAddress {
        city: address.dependent_locality.clone().unwrap_or_default(),
        country: address
            .country
            .clone()
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
        postal_code: address.postal_code.clone().unwrap_or_default(),
        state: address.region.clone().unwrap_or_default(),
        street_name,
        street_number,
        apartment: address.address_line.get(1).cloned(),
        email: address.email.clone().unwrap_or_default(),
        phone: strip_phone_prefix(address.phone.as_deref().unwrap_or("")),
        first_name: String::new(),
        last_name: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_street_line_first_space_only() {
        assert_eq!(
            split_street_line("123 Main St"),
            ("123".to_string(), "Main".to_string())
        );
        assert_eq!(
            split_street_line("456"),
            ("456".to_string(), String::new())
        );
        assert_eq!(split_street_line(""), (String::new(), String::new()));
    }

    #[test]
    fn test_contact_to_address_splits_street() {
        let contact = PaymentContact {
            address_lines: vec!["123 Main St".to_string()],
            ..Default::default()
        };
        let address = contact_to_address(&contact);
        assert_eq!(address.street_number, "123");
        assert_eq!(address.street_name, "Main");
    }

    #[test]
    fn test_contact_to_address_defaults() {
        let address = contact_to_address(&PaymentContact::default());
        assert_eq!(address.country, DEFAULT_COUNTRY);
        assert_eq!(address.city, "");
        assert_eq!(address.first_name, "");
        assert_eq!(address.apartment, None);
    }

    #[test]
    fn test_contact_to_address_strips_phone_prefix() {
        let contact = PaymentContact {
            phone_number: Some("+15551234567".to_string()),
            ..Default::default()
        };
        assert_eq!(contact_to_address(&contact).phone, "5551234567");

        let plain = PaymentContact {
            phone_number: Some("5551234567".to_string()),
            ..Default::default()
        };
        assert_eq!(contact_to_address(&plain).phone, "5551234567");
    }

    #[test]
    fn test_contact_to_address_apartment_line() {
        let contact = PaymentContact {
            address_lines: vec!["9 Elm Ave".to_string(), "Apt 4B".to_string()],
            ..Default::default()
        };
        let address = contact_to_address(&contact);
        assert_eq!(address.apartment.as_deref(), Some("Apt 4B"));
    }

    #[test]
    fn test_address_to_contact_rebuilds_line_one() {
        let address = ShippingAddress {
            street_number: "123".to_string(),
            street_name: "Main".to_string(),
            apartment: Some("Apt 4B".to_string()),
            city: "Springfield".to_string(),
            country: "US".to_string(),
            ..Default::default()
        };
        let contact = address_to_contact(&address);
        assert_eq!(contact.address_lines, vec!["123 Main", "Apt 4B"]);
        assert_eq!(contact.locality.as_deref(), Some("Springfield"));
    }

    #[test]
    fn test_payment_address_city_from_dependent_locality() {
        let address = PaymentAddress {
            dependent_locality: Some("Brooklyn".to_string()),
            city: Some("New York".to_string()),
            region: Some("NY".to_string()),
            address_line: vec!["77 Water St".to_string()],
            ..Default::default()
        };
        let translated = payment_address_to_address(&address);
        assert_eq!(translated.city, "Brooklyn");
        assert_eq!(translated.state, "NY");
        assert_eq!(translated.street_number, "77");
        assert_eq!(translated.street_name, "Water");
        assert_eq!(translated.first_name, "");
    }
}
