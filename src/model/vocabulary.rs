//! Pathology label vocabulary

/// Labels of the multi-dataset chest X-ray classifier, in output order
pub const DEFAULT_PATHOLOGIES: [&str; 18] = [
    "Atelectasis",
    "Consolidation",
    "Infiltration",
    "Pneumothorax",
    "Edema",
    "Emphysema",
    "Fibrosis",
    "Effusion",
    "Pneumonia",
    "Pleural_Thickening",
    "Cardiomegaly",
    "Nodule",
    "Mass",
    "Hernia",
    "Lung Lesion",
    "Fracture",
    "Lung Opacity",
    "Enlarged Cardiomediastinum",
];

/// Owned copy of the default vocabulary
pub fn default_vocabulary() -> Vec<String> {
    DEFAULT_PATHOLOGIES.iter().map(ToString::to_string).collect()
}

/// Filesystem-safe form of a pathology name
pub fn file_stem(pathology: &str) -> String {
    pathology
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}
