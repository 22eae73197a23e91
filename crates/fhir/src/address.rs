//! Flat key/value view of a wire [`Address`].
//!
//! Addresses cross the field registry as string maps so a single IJE geographic field can read
//! or write one key without knowing the rest of the structure. City and county codes ride on
//! the `_city`/`_district` elements; the city-limits indicator is an address extension.

use std::collections::BTreeMap;

use vrx_types::YesNoUnknown;

use crate::codes;
use crate::wire::{Address, Coding, Element, Extension};

/// Address components keyed by the names in [`keys`].
pub type AddressMap = BTreeMap<String, String>;

pub mod keys {
    pub const LINE1: &str = "addressLine1";
    pub const CITY: &str = "addressCity";
    pub const CITY_CODE: &str = "addressCityC";
    pub const COUNTY: &str = "addressCounty";
    pub const COUNTY_CODE: &str = "addressCountyC";
    pub const STATE: &str = "addressState";
    pub const ZIP: &str = "addressZip";
    pub const COUNTRY: &str = "addressCountry";
    pub const CITY_LIMITS: &str = "addressCityLimits";

    pub const ALL: [&str; 9] = [
        LINE1,
        CITY,
        CITY_CODE,
        COUNTY,
        COUNTY_CODE,
        STATE,
        ZIP,
        COUNTRY,
        CITY_LIMITS,
    ];
}

const YES_NO: &str = "http://terminology.hl7.org/CodeSystem/v2-0136";

/// Flattens an address. Blank components are omitted.
pub fn to_map(address: &Address) -> AddressMap {
    let mut map = AddressMap::new();
    let mut put = |key: &str, value: Option<String>| {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            map.insert(key.to_string(), value);
        }
    };

    put(keys::LINE1, address.line.first().cloned());
    put(keys::CITY, address.city.clone());
    put(keys::CITY_CODE, code_of(address.city_element.as_ref(), codes::CITY_CODE_URL));
    put(keys::COUNTY, address.district.clone());
    put(
        keys::COUNTY_CODE,
        code_of(address.district_element.as_ref(), codes::DISTRICT_CODE_URL),
    );
    put(keys::STATE, address.state.clone());
    put(keys::ZIP, address.postal_code.clone());
    put(keys::COUNTRY, address.country.clone());
    put(
        keys::CITY_LIMITS,
        address
            .extension
            .iter()
            .find(|x| x.url == codes::WITHIN_CITY_LIMITS_URL)
            .and_then(|x| x.value_coding.as_ref())
            .and_then(|c| c.code.as_deref())
            .map(|code| YesNoUnknown::from_code(code).as_code().to_string()),
    );
    map
}

/// Builds an address from a map. Unrecognised keys are ignored.
pub fn from_map(map: &AddressMap) -> Address {
    let get = |key: &str| map.get(key).filter(|v| !v.trim().is_empty()).cloned();

    let mut address = Address {
        line: get(keys::LINE1).into_iter().collect(),
        city: get(keys::CITY),
        city_element: code_element(get(keys::CITY_CODE), codes::CITY_CODE_URL),
        district: get(keys::COUNTY),
        district_element: code_element(get(keys::COUNTY_CODE), codes::DISTRICT_CODE_URL),
        state: get(keys::STATE),
        postal_code: get(keys::ZIP),
        country: get(keys::COUNTRY),
        ..Address::default()
    };

    if let Some(limits) = get(keys::CITY_LIMITS) {
        let coding = match YesNoUnknown::from_code(&limits) {
            YesNoUnknown::Yes => Coding::new(YES_NO, "Y", Some("Yes")),
            YesNoUnknown::No => Coding::new(YES_NO, "N", Some("No")),
            YesNoUnknown::Unknown => Coding::new(codes::NULL_FLAVOR, codes::UNKNOWN, Some("unknown")),
        };
        let mut ext = Extension::new(codes::WITHIN_CITY_LIMITS_URL);
        ext.value_coding = Some(coding);
        address.extension.push(ext);
    }

    address
}

fn code_of(element: Option<&Element>, url: &str) -> Option<String> {
    element?
        .extension
        .iter()
        .find(|x| x.url == url)
        .and_then(|x| x.value_positive_int.or(x.value_unsigned_int))
        .map(|v| v.to_string())
}

fn code_element(code: Option<String>, url: &str) -> Option<Element> {
    let code = code?;
    match code.trim().parse::<u32>() {
        Ok(value) => {
            let mut ext = Extension::new(url);
            if value > 0 {
                ext.value_positive_int = Some(value);
            } else {
                ext.value_unsigned_int = Some(value);
            }
            Some(Element::with_extension(ext))
        }
        Err(_) => {
            tracing::warn!(code = %code, "dropping non-numeric address code");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AddressMap {
        [
            (keys::LINE1, "12 Elm St"),
            (keys::CITY, "Salem"),
            (keys::CITY_CODE, "1234"),
            (keys::COUNTY, "Marion"),
            (keys::COUNTY_CODE, "47"),
            (keys::STATE, "OR"),
            (keys::ZIP, "97301"),
            (keys::COUNTRY, "US"),
            (keys::CITY_LIMITS, "Y"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn map_survives_the_wire_shape() {
        let map = sample();
        assert_eq!(to_map(&from_map(&map)), map);
    }

    #[test]
    fn codes_live_on_element_extensions() {
        let address = from_map(&sample());
        let city = address.city_element.expect("city element");
        assert_eq!(city.extension[0].url, codes::CITY_CODE_URL);
        assert_eq!(city.extension[0].value_positive_int, Some(1234));
    }

    #[test]
    fn zero_codes_are_kept() {
        let mut map = AddressMap::new();
        map.insert(keys::COUNTY_CODE.into(), "000".into());

        let address = from_map(&map);
        let county = address.district_element.as_ref().expect("county element");
        assert_eq!(county.extension[0].value_unsigned_int, Some(0));
        assert_eq!(to_map(&address).get(keys::COUNTY_CODE).map(String::as_str), Some("0"));
    }

    #[test]
    fn blank_and_invalid_values_are_dropped() {
        let mut map = AddressMap::new();
        map.insert(keys::CITY.into(), "  ".into());
        map.insert(keys::COUNTY_CODE.into(), "abc".into());
        map.insert(keys::STATE.into(), "MA".into());

        let round_tripped = to_map(&from_map(&map));
        assert_eq!(round_tripped.len(), 1);
        assert_eq!(round_tripped.get(keys::STATE).map(String::as_str), Some("MA"));
    }
}
