use std::collections::HashMap;

use regex::Regex;

/// A typed slot value extracted from the reasoner's fact dump.
#[derive(Clone, Debug, PartialEq)]
pub enum SlotValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl SlotValue {
    /// Parses one raw slot token: quoted → text with quotes stripped,
    /// numeric with "." → float, other numeric → integer, anything else →
    /// text.
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
            return Self::Text(trimmed[1..trimmed.len() - 1].to_string());
        }
        if trimmed.contains('.') {
            if let Ok(f) = trimmed.parse::<f64>() {
                return Self::Float(f);
            }
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return Self::Int(n);
        }
        Self::Text(trimmed.to_string())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Float(f) => Some(*f as i64),
            Self::Text(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            Self::Text(_) => None,
        }
    }
}

/// The parsed fact base: fact name → slot name → typed value.
///
/// The parser only recognizes slotted facts — `(name (slot value) ...)` —
/// which is the whole output vocabulary the engine consumes. Unslotted
/// bookkeeping facts in the dump are skipped.
#[derive(Debug, Default)]
pub struct FactBase {
    facts: HashMap<String, HashMap<String, SlotValue>>,
}

impl FactBase {
    pub fn parse(output: &str) -> Self {
        // Fact block: name followed by one or more parenthesized slots.
        let fact_pattern = Regex::new(r"(?s)\(([a-z-]+)\s+((?:\([^)]*\)\s*)+)\)")
            .expect("fact pattern");
        let slot_pattern = Regex::new(r"\(([a-z-]+)\s+([^)]+)\)").expect("slot pattern");

        let mut facts = HashMap::new();
        for fact in fact_pattern.captures_iter(output) {
            let name = fact[1].to_string();
            let body = &fact[2];

            let mut slots = HashMap::new();
            for slot in slot_pattern.captures_iter(body) {
                slots.insert(slot[1].to_string(), SlotValue::parse(&slot[2]));
            }
            facts.insert(name, slots);
        }

        Self { facts }
    }

    pub fn contains(&self, fact: &str) -> bool {
        self.facts.contains_key(fact)
    }

    pub fn slot_str(&self, fact: &str, slot: &str) -> Option<&str> {
        self.facts.get(fact)?.get(slot)?.as_str()
    }

    pub fn slot_i64(&self, fact: &str, slot: &str) -> Option<i64> {
        self.facts.get(fact)?.get(slot)?.as_i64()
    }

    pub fn slot_f64(&self, fact: &str, slot: &str) -> Option<f64> {
        self.facts.get(fact)?.get(slot)?.as_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_typed_slots() {
        let output = r#"
f-12    (diagnostico (causa-probable "Sin alimentación eléctrica") (probabilidad 85) (componente-afectado "Circuito eléctrico / Enchufe"))
f-13    (solucion (tiempo-estimado 10) (costo-estimado 5000.0) (pasos "paso uno|paso dos"))
"#;
        let base = FactBase::parse(output);

        assert!(base.contains("diagnostico"));
        assert_eq!(
            base.slot_str("diagnostico", "causa-probable"),
            Some("Sin alimentación eléctrica")
        );
        assert_eq!(base.slot_i64("diagnostico", "probabilidad"), Some(85));
        assert_eq!(base.slot_f64("solucion", "costo-estimado"), Some(5000.0));
        assert_eq!(base.slot_i64("solucion", "tiempo-estimado"), Some(10));
    }

    #[test]
    fn test_parse_skips_unslotted_facts() {
        let output = "f-0     (initial-fact)\nf-1     (decision (tipo diy) (urgencia alta) (requiere-tecnico no))";
        let base = FactBase::parse(output);

        assert!(!base.contains("initial-fact"));
        assert_eq!(base.slot_str("decision", "tipo"), Some("diy"));
        assert_eq!(base.slot_str("decision", "urgencia"), Some("alta"));
    }

    #[test]
    fn test_parse_multiline_fact() {
        let output = "(orden-trabajo (prioridad critica)\n    (repuestos-probables \"Mica protectora,Magnetrón\"))";
        let base = FactBase::parse(output);
        assert_eq!(
            base.slot_str("orden-trabajo", "repuestos-probables"),
            Some("Mica protectora,Magnetrón")
        );
    }

    #[test]
    fn test_slot_value_typing() {
        assert_eq!(SlotValue::parse("85"), SlotValue::Int(85));
        assert_eq!(SlotValue::parse("5000.5"), SlotValue::Float(5000.5));
        assert_eq!(
            SlotValue::parse("\"85\""),
            SlotValue::Text("85".to_string())
        );
        assert_eq!(SlotValue::parse("si"), SlotValue::Text("si".to_string()));
    }
}
