//! Static airline designator table.

/// Airline name returned when a code is not in the table.
pub const UNKNOWN_AIRLINE: &str = "Unknown Airline";

/// `(ICAO designator, IATA designator, name)`.
const AIRLINES: &[(&str, &str, &str)] = &[
    // North America
    ("AAL", "AA", "American Airlines"),
    ("UAL", "UA", "United Airlines"),
    ("DAL", "DL", "Delta Air Lines"),
    ("SWA", "WN", "Southwest Airlines"),
    ("JBU", "B6", "JetBlue Airways"),
    ("ASA", "AS", "Alaska Airlines"),
    ("HAL", "HA", "Hawaiian Airlines"),
    ("FFT", "F9", "Frontier Airlines"),
    ("NKS", "NK", "Spirit Airlines"),
    ("SKW", "OO", "SkyWest Airlines"),
    ("RPA", "YX", "Republic Airways"),
    ("ENY", "MQ", "Envoy Air"),
    ("PDT", "PT", "Piedmont Airlines"),
    ("JIA", "OH", "PSA Airlines"),
    ("ASH", "YV", "Mesa Airlines"),
    ("GJS", "G7", "GoJet Airlines"),
    ("FDX", "FX", "FedEx Express"),
    ("UPS", "5X", "UPS Airlines"),
    ("ACA", "AC", "Air Canada"),
    ("WJA", "WS", "WestJet"),
    ("POE", "PD", "Porter Airlines"),
    ("AMX", "AM", "Aeromexico"),
    // Europe
    ("DLH", "LH", "Lufthansa"),
    ("BAW", "BA", "British Airways"),
    ("AFR", "AF", "Air France"),
    ("KLM", "KL", "KLM Royal Dutch Airlines"),
    ("SWR", "LX", "Swiss International Air Lines"),
    ("AUA", "OS", "Austrian Airlines"),
    ("BEL", "SN", "Brussels Airlines"),
    ("IBE", "IB", "Iberia"),
    ("ITY", "AZ", "ITA Airways"),
    ("TAP", "TP", "TAP Air Portugal"),
    ("AEE", "A3", "Aegean Airlines"),
    ("SAS", "SK", "Scandinavian Airlines"),
    ("FIN", "AY", "Finnair"),
    ("RYR", "FR", "Ryanair"),
    ("EZY", "U2", "easyJet"),
    ("VLG", "VY", "Vueling"),
    ("WZZ", "W6", "Wizz Air"),
    ("EIN", "EI", "Aer Lingus"),
    ("VIR", "VS", "Virgin Atlantic"),
    ("NAX", "DY", "Norwegian Air Shuttle"),
    // Middle East and Africa
    ("UAE", "EK", "Emirates"),
    ("QTR", "QR", "Qatar Airways"),
    ("ETD", "EY", "Etihad Airways"),
    ("THY", "TK", "Turkish Airlines"),
    ("MSR", "MS", "EgyptAir"),
    ("SVA", "SV", "Saudia"),
    ("ELY", "LY", "El Al"),
    ("SAA", "SA", "South African Airways"),
    ("ETH", "ET", "Ethiopian Airlines"),
    ("RAM", "AT", "Royal Air Maroc"),
    ("KQA", "KQ", "Kenya Airways"),
    // Asia and Oceania
    ("SIA", "SQ", "Singapore Airlines"),
    ("CPA", "CX", "Cathay Pacific"),
    ("JAL", "JL", "Japan Airlines"),
    ("ANA", "NH", "All Nippon Airways"),
    ("KAL", "KE", "Korean Air"),
    ("AAR", "OZ", "Asiana Airlines"),
    ("THA", "TG", "Thai Airways"),
    ("MAS", "MH", "Malaysia Airlines"),
    ("CAL", "CI", "China Airlines"),
    ("EVA", "BR", "EVA Air"),
    ("CSN", "CZ", "China Southern Airlines"),
    ("CCA", "CA", "Air China"),
    ("CES", "MU", "China Eastern Airlines"),
    ("AIC", "AI", "Air India"),
    ("IGO", "6E", "IndiGo"),
    ("QFA", "QF", "Qantas"),
    ("JST", "JQ", "Jetstar"),
    ("VOZ", "VA", "Virgin Australia"),
    ("ANZ", "NZ", "Air New Zealand"),
    ("FJI", "FJ", "Fiji Airways"),
    // Latin America
    ("AVA", "AV", "Avianca"),
    ("LAN", "LA", "LATAM Airlines"),
    ("GLO", "G3", "Gol"),
    ("ARG", "AR", "Aerolineas Argentinas"),
    ("CMP", "CM", "Copa Airlines"),
];

/// Look up an airline by ICAO (3-letter) or IATA (2-character) designator.
///
/// Matching is case-insensitive and ignores surrounding whitespace.
#[must_use]
pub fn airline_name(code: &str) -> Option<&'static str> {
    let code = code.trim();
    AIRLINES
        .iter()
        .find(|(icao, iata, _)| icao.eq_ignore_ascii_case(code) || iata.eq_ignore_ascii_case(code))
        .map(|(_, _, name)| *name)
}

/// All ICAO designators in the table.
pub fn icao_codes() -> impl Iterator<Item = &'static str> {
    AIRLINES.iter().map(|(icao, _, _)| *icao)
}
