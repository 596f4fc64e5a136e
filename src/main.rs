// =============================================================================
// CATREL — Point d'entrée : démonstration de l'algèbre de relations
// =============================================================================
//
// Ce main.rs montre un exemple complet :
//   1. Une relation de profondeur 1 (TEST_FUNC) : domaine, codomaine, eval
//   2. Une "lentille" de profondeur 2 (TEST_LENS) : codomaine de relations
//   3. La composition, et son absorption par EMPTY
//
// Niveau de log via RUST_LOG (par défaut : info).
//
// =============================================================================

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use catrel::{Relation, Value};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("╔══════════════════════════════════════════════════╗");
    println!("║      CATREL — Relations hiérarchiques            ║");
    println!("╚══════════════════════════════════════════════════╝\n");

    // ═══════════════════════════════════════════════════════════
    // ÉTAPE 1 : Une relation de profondeur 1
    // ═══════════════════════════════════════════════════════════
    println!("═══ ÉTAPE 1 : TEST_FUNC (profondeur 1) ═══\n");

    let func = Relation::new(
        [(1, 1), (2, 3), (3, 2)].map(|(k, v)| (k, Value::Atom(v))),
        1,
    )?;

    println!("TEST_FUNC          = {}", func);
    println!("domain()           = {:?}", func.domain());
    let images: Vec<String> = func.codomain()?.iter().map(ToString::to_string).collect();
    println!("codomain()         = [{}]", images.join(", "));
    println!("eval(2)            = {}\n", func.eval(&2)?);

    // ═══════════════════════════════════════════════════════════
    // ÉTAPE 2 : La lentille de profondeur 2
    // ═══════════════════════════════════════════════════════════
    println!("═══ ÉTAPE 2 : TEST_LENS (profondeur 2) ═══\n");

    let lens = Relation::new(
        [(1, (5, 5)), (1, (6, 6)), (2, (5, 6)), (2, (6, 5))].map(|(k, v)| (k, Value::from(v))),
        2,
    )?;

    println!("TEST_LENS          = {}", lens);
    println!("eval(1)            = {}", lens.eval(&1)?);
    let images: Vec<String> = lens.codomain()?.iter().map(ToString::to_string).collect();
    println!("codomain()         = [{}]\n", images.join(", "));

    // ═══════════════════════════════════════════════════════════
    // ÉTAPE 3 : Composition
    // ═══════════════════════════════════════════════════════════
    println!("═══ ÉTAPE 3 : Composition ═══\n");

    println!("TEST_FUNC ∘ TEST_FUNC = {}", func.compose(&func));
    println!("TEST_LENS ∘ TEST_LENS = {}", lens.compose(&lens));
    println!(
        "TEST_FUNC ∘ TEST_LENS = {}  (profondeurs différentes → EMPTY)",
        func.compose(&lens)
    );

    Ok(())
}
