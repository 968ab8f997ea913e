// Seed vocabularies for polarity.
//
// The lexicon classifier matches these directly; SemAxis embeds them and uses
// the mean of each list as the pole of a negative→positive axis. German
// compounds are written with underscores and matched with spaces.

use crate::models::Language;

pub const NEGATIVE_ES: &[&str] = &[
    "frustración", "tardado", "enojo", "ira", "molestia", "enfado", "robo", "asalto",
    "inseguro", "inseguridad", "miedo", "caro", "costoso", "insatisfacción", "insatisfecho",
    "lento", "mal servicio", "deficiente", "problema", "error", "fallo", "decepción",
    "estrés", "incidente", "atraso", "demora", "cancelación", "incómodo", "sucio",
    "ruidoso", "masificado", "hacinamiento", "desorganizado", "falto de respeto",
    "peligroso", "espera larga", "clima adverso", "mal señalizado", "confusión",
    "desinformación", "agotador", "incivilidad", "mala atención", "inexacto",
    "inconveniente", "sobreventa", "mal mantenimiento", "inseguridad vial", "desagradable",
    "frustrante", "perder",
];

pub const POSITIVE_ES: &[&str] = &[
    "satisfacción", "rápido", "alegría", "confianza", "seguro", "barato", "excelente",
    "eficiente", "buen servicio", "correcto", "solución", "acierto", "confiable",
    "agradable", "éxito", "contento", "puntual", "cómodo", "limpio", "tranquilo", "frecuente",
    "bien señalizado", "organizado", "bien iluminado", "accesible", "ordenado",
    "servicio amable", "buena frecuencia", "rápida atención", "sin demora", "sin problemas",
    "fluido", "respetuoso", "efectivo", "bien comunicado", "entendible", "coherente",
    "práctico", "agradable viaje", "confortable", "tranquilo viaje", "eficiente horario",
    "seguro transporte", "limpieza", "bien cuidado", "buena señalización", "orden",
    "excelente atención",
];

pub const NEGATIVE_DE: &[&str] = &[
    "frustration", "verspätung", "wut", "ärger", "ärgernis", "raub", "überfall", "unsicher",
    "angst", "teuer", "unzufrieden", "langsam", "schlechter_service", "problem", "fehler",
    "mangel", "enttäuschung", "ausfall", "unbequem", "schmutzig", "laut", "überfüllt",
    "enge", "unorganisiert", "respektlos", "gefährlich", "lange_wartezeit", "schlechtes_wetter",
    "schlechte_beschilderung", "verwirrung", "fehlende_information", "ermüdend", "rüpelhaft",
    "unfreundlich", "unzuverlässig", "chaotisch", "stau", "konfus", "problematisch",
    "verzögerung", "überlastet", "ungemütlich", "veraltet", "unpraktisch", "fehlplan",
    "schwierig", "unangenehm",
];

pub const POSITIVE_DE: &[&str] = &[
    "zufriedenheit", "schnell", "freude", "vertrauen", "sicher", "günstig", "exzellent",
    "effizient", "guter_service", "korrekt", "lösung", "erfolg", "verlässlich", "angenehm",
    "glücklich", "pünktlich", "komfortabel", "sauber", "ruhig", "häufig", "gut_beschildert",
    "organisiert", "gut_beleuchtet", "barrierefrei", "geordnet", "freundlicher_service",
    "gute_frequenz", "schnelle_bearbeitung", "ohne_verzögerung", "problemfrei", "fließend",
    "respektvoll", "effektiv", "gut_kommuniziert", "verständlich", "kohärent", "praktisch",
    "angenehme_reise", "komfortable_fahrt", "ruhige_fahrt", "effizienter_fahrplan",
    "sicherer_transport", "sauberkeit", "gut_gepflegt", "gute_beschilderung", "ordnung",
    "ausgezeichneter_service",
];

/// (negative, positive) seeds for a language, as plain phrases.
pub fn seeds_for(language: Language) -> Option<(Vec<String>, Vec<String>)> {
    let (neg, pos) = match language {
        Language::Spanish => (NEGATIVE_ES, POSITIVE_ES),
        Language::German => (NEGATIVE_DE, POSITIVE_DE),
        Language::Unsupported => return None,
    };
    let phrases = |list: &[&str]| list.iter().map(|s| s.replace('_', " ")).collect();
    Some((phrases(neg), phrases(pos)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_german_compounds_use_spaces() {
        let (neg, _) = seeds_for(Language::German).unwrap();
        assert!(neg.contains(&"lange wartezeit".to_string()));
        assert!(seeds_for(Language::Unsupported).is_none());
    }
}
