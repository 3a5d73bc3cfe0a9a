//! Blog categories and their section slugs

/// Label that expands to every section
pub const ALL_CATEGORIES: &str = "todas las categorias";

/// Categories accepted out of the box, canonical spelling
pub const DEFAULT_CATEGORIES: [&str; 7] = [
    ALL_CATEGORIES,
    "pymes",
    "corporativos",
    "casos de exito",
    "educacion financiera",
    "xepelin",
    "emprendedores",
];

const SECTIONS: [(&str, &str); 6] = [
    ("pymes", "pymes"),
    ("corporativos", "corporativos"),
    ("casos de exito", "empresarios-exitosos"),
    ("educacion financiera", "educacion-financiera"),
    ("xepelin", "noticias"),
    ("emprendedores", "emprendedores"),
];

/// Lowercase a label, fold common accents and collapse whitespace
pub fn normalize(label: &str) -> String {
    let folded: String = label
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Section slug for a single category label
pub fn section_slug(label: &str) -> Option<&'static str> {
    let key = normalize(label);
    SECTIONS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, slug)| *slug)
}

/// Every section a label covers; the aggregate label covers them all
pub fn sections_for(label: &str) -> Option<Vec<&'static str>> {
    if normalize(label) == ALL_CATEGORIES {
        return Some(SECTIONS.iter().map(|(_, slug)| *slug).collect());
    }
    section_slug(label).map(|slug| vec![slug])
}

/// Filesystem-friendly form of a label
pub fn file_slug(label: &str) -> String {
    normalize(label).replace(' ', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Educación   Financiera "), "educacion financiera");
        assert_eq!(normalize("PYMES"), "pymes");
    }

    #[test]
    fn test_section_slug() {
        assert_eq!(section_slug("Casos de Éxito"), Some("empresarios-exitosos"));
        assert_eq!(section_slug("xepelin"), Some("noticias"));
        assert_eq!(section_slug("recetas"), None);
    }

    #[test]
    fn test_aggregate_expands() {
        let sections = sections_for("Todas las categorías").unwrap();
        assert_eq!(sections.len(), 6);
        assert_eq!(sections_for("pymes").unwrap(), vec!["pymes"]);
        assert!(sections_for("nope").is_none());
    }

    #[test]
    fn test_file_slug() {
        assert_eq!(file_slug("Casos de exito"), "casos-de-exito");
    }
}
