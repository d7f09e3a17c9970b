//! GST state code utilities.
//!
//! The first two characters of a GSTIN are the state code of the
//! registration. Codes 25 and 28 were retired when Daman and Diu merged
//! and Andhra Pradesh moved to 37.

use crate::UNKNOWN_STATE;

/// GST state and territory codes currently issued.
pub const GST_STATE_CODES: &[&str] = &[
    "01", "02", "03", "04", "05", "06", "07", "08", "09", "10", "11", "12", "13", "14", "15", "16",
    "17", "18", "19", "20", "21", "22", "23", "24", "26", "27", "29", "30", "31", "32", "33", "34",
    "35", "36", "37", "38", "97", "99",
];

/// Maps a two-digit GST state code to the state or territory name.
///
/// Returns `"Unknown"` for unrecognized codes.
#[must_use]
pub fn state_name(code: &str) -> &'static str {
    match code {
        "01" => "Jammu and Kashmir",
        "02" => "Himachal Pradesh",
        "03" => "Punjab",
        "04" => "Chandigarh",
        "05" => "Uttarakhand",
        "06" => "Haryana",
        "07" => "Delhi",
        "08" => "Rajasthan",
        "09" => "Uttar Pradesh",
        "10" => "Bihar",
        "11" => "Sikkim",
        "12" => "Arunachal Pradesh",
        "13" => "Nagaland",
        "14" => "Manipur",
        "15" => "Mizoram",
        "16" => "Tripura",
        "17" => "Meghalaya",
        "18" => "Assam",
        "19" => "West Bengal",
        "20" => "Jharkhand",
        "21" => "Odisha",
        "22" => "Chhattisgarh",
        "23" => "Madhya Pradesh",
        "24" => "Gujarat",
        "26" => "Dadra and Nagar Haveli and Daman and Diu",
        "27" => "Maharashtra",
        "29" => "Karnataka",
        "30" => "Goa",
        "31" => "Lakshadweep",
        "32" => "Kerala",
        "33" => "Tamil Nadu",
        "34" => "Puducherry",
        "35" => "Andaman and Nicobar Islands",
        "36" => "Telangana",
        "37" => "Andhra Pradesh",
        "38" => "Ladakh",
        "97" => "Other Territory",
        "99" => "Centre Jurisdiction",
        _ => UNKNOWN_STATE,
    }
}

/// Derives the state from the leading code of a GSTIN.
///
/// Inputs shorter than two characters map to `"Unknown"`.
#[must_use]
pub fn state_from_gstin(gstin: &str) -> &'static str {
    gstin.trim().get(..2).map_or(UNKNOWN_STATE, state_name)
}
