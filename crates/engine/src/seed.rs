use triage_common::types::{ApplianceKind, Case};

use crate::repo::CaseRepo;

/// Inserts the demo cases when the repository starts empty.
pub fn seed_demo_cases(repo: &CaseRepo) {
    if !repo.is_empty() {
        return;
    }

    let mut fridge = Case::new(
        ApplianceKind::Refrigerator,
        "La heladera no mantiene la temperatura",
    );
    fridge.description = "Heladera no enfría correctamente".to_string();
    fridge.customer_name = "Juan Pérez".to_string();
    fridge.customer_phone = "1234567890".to_string();
    fridge.brand = "Samsung".to_string();
    fridge.model = "RT38K5932SL".to_string();
    fridge.age_years = Some(3);

    let mut washer = Case::new(
        ApplianceKind::Washer,
        "No responde al presionar el botón de encendido",
    );
    washer.description = "Lavarropas no enciende".to_string();
    washer.customer_name = "María García".to_string();
    washer.customer_phone = "0987654321".to_string();
    washer.brand = "LG".to_string();
    washer.model = "WM3488HW".to_string();
    washer.age_years = Some(5);

    let mut microwave = Case::new(ApplianceKind::Microwave, "Funciona pero no calienta la comida");
    microwave.description = "Microondas no calienta".to_string();
    microwave.customer_name = "Carlos López".to_string();
    microwave.customer_phone = "1122334455".to_string();
    microwave.brand = "Whirlpool".to_string();
    microwave.model = "WM1404W".to_string();
    microwave.age_years = Some(2);

    for case in [fridge, washer, microwave] {
        let inserted = repo.insert_case(case);
        tracing::info!(case_id = %inserted.id, "Demo case created");
    }
}
