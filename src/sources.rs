// src/sources.rs
//! Published source locations for the two dataset families. URLs are pinned
//! to the exact uploads the datasets were generated from.

/// One KAA accreditation table release.
pub struct ProgrammeSource {
    /// Filename expected under the raw directory.
    pub file: &'static str,
    pub source_url: &'static str,
    pub category: &'static str,
    pub output_file: &'static str,
    /// Academic year the table covers, e.g. "2025-2026".
    pub period: &'static str,
    /// Upload revision, when the published filename carries one.
    pub version: Option<&'static str>,
}

pub const PROGRAMME_SOURCES: &[ProgrammeSource] = &[
    ProgrammeSource {
        file: "Tabela-Programet-e-Akredituara-2025-2026_v5.xlsx",
        source_url: "https://akreditimi.rks-gov.net/wp-content/uploads/Tabela-Programet-e-Akredituara-2025-2026_v5.xlsx",
        category: "accredited_programmes",
        output_file: "programmes_2025_2026.json",
        period: "2025-2026",
        version: Some("v5"),
    },
    ProgrammeSource {
        // "Proggramet" is how the upload is actually named
        file: "AKA-KAA-Proggramet-e-Akredituara-2023-2024.xlsx",
        source_url: "https://akreditimi.rks-gov.net/wp-content/uploads/2023/08/AKA-KAA-Proggramet-e-Akredituara-2023-2024.xlsx",
        category: "accredited_programmes",
        output_file: "programmes_2023_2024.json",
        period: "2023-2024",
        version: None,
    },
];

/// Yearly permit lists published by the municipality. The percent-encoded
/// suffixes are upload-revision artefacts and must be kept verbatim.
pub const PERMIT_SOURCES: &[(i32, &str)] = &[
    (2025, "https://prishtinaonline.com/uploads/lista_e_lejeve_te_leshuara_per_vitin_2025%20%283%29.xlsx"),
    (2024, "https://prishtinaonline.com/uploads/lista_e_lejeve_te_leshuara_per_vitin_2024%20%2810%29.xlsx"),
    (2023, "https://prishtinaonline.com/uploads/lista_e_lejeve_te_leshuara_per_vitin_2023%20%281%29.xlsx"),
    (2022, "https://prishtinaonline.com/uploads/lista_e_lejeve_te_leshuara_2022_23.03.2023.xlsx"),
    (2021, "https://prishtinaonline.com/uploads/lista_e_lejeve_te_leshuara_per_vitin_2021_13.12.2021.xlsx"),
    (2020, "https://prishtinaonline.com/uploads/lista_e_lejeve_te_leshuara_per_vitin_2020_final%20%281%29.xlsx"),
    (2019, "https://prishtinaonline.com/uploads/lista_e_lejeve_te_leshuara_per_vitin_2019%20%2811%29.xlsx"),
    (2018, "https://prishtinaonline.com/uploads/lista_e_lejeve_te_leshuara_per_vitin_2018%20%283%29.xlsx"),
    (2017, "https://prishtinaonline.com/uploads/lista-e-lejeve-te-leshuara-per-vitin-2017%20%286%29.xlsx"),
    (2016, "https://prishtinaonline.com/uploads/lista_e_lejeve_te_leshuara_per_vitin_2016%20%2816%29.xlsx"),
    (2015, "https://prishtinaonline.com/uploads/lista_e_lejeve_te_leshuara_per_vitin_2015%20%288%29.xlsx"),
    (2014, "https://prishtinaonline.com/uploads/lista_e_lejeve_te_leshuara_per_vitin_2014.xlsx"),
    (2013, "https://prishtinaonline.com/uploads/lista_e_lejeve_te_leshuara_per_vitin_2013.xlsx"),
    (2012, "https://prishtinaonline.com/uploads/lista_e_lejeve_te_leshuara_per_vitin_2012.xlsx"),
];

pub fn permit_source_url(year: i32) -> Option<&'static str> {
    PERMIT_SOURCES
        .iter()
        .find(|(y, _)| *y == year)
        .map(|(_, url)| *url)
}
