//! End-to-end behaviour of the active-solution registry as a host sees it:
//! subscribe to mirrors, edit, switch, reset.

use std::cell::RefCell;
use std::rc::Rc;

use abs_model::{AbsConfig, BarMagnitude, ModelError, SolutionKind, SolutionRegistry, Species, bar_reading};

fn custom() -> SolutionRegistry {
    SolutionRegistry::custom_solution(Rc::new(AbsConfig::default()))
}

#[test]
fn switch_carries_concentration_and_unlinks_previous() {
    let mut registry = custom();
    registry.set_active(SolutionKind::StrongAcid).unwrap();
    registry.set_concentration(0.5).unwrap();

    let seen = Rc::new(RefCell::new(Vec::new()));
    let seen_inner = Rc::clone(&seen);
    let _sub = registry
        .concentration()
        .subscribe(move |new, _| seen_inner.borrow_mut().push(*new));

    registry.set_active(SolutionKind::WeakAcid).unwrap();
    let weak = registry.solution(SolutionKind::WeakAcid).unwrap();
    assert_eq!(weak.concentration().get(), 0.5);

    // Edits on the old solution no longer reach the mirror; the new one's do.
    let strong = registry.solution(SolutionKind::StrongAcid).unwrap();
    strong.set_concentration(0.05).unwrap();
    weak.set_concentration(0.25).unwrap();
    assert_eq!(registry.concentration().get(), 0.25);
    assert_eq!(*seen.borrow(), vec![0.25]);
}

#[test]
fn carried_concentration_is_clamped_into_target_range() {
    let config = Rc::new(AbsConfig::default());
    let mut registry = SolutionRegistry::introduction(Rc::clone(&config));
    // Water holds its concentration at the range ceiling; a carried value
    // always lands inside the target's range.
    registry.set_concentration(40.0).unwrap();
    registry.set_active(SolutionKind::StrongBase).unwrap();
    assert_eq!(registry.concentration().get(), config.concentration.max);
}

#[test]
fn ph_mirror_tracks_switches() {
    let mut registry = SolutionRegistry::introduction(Rc::new(AbsConfig::default()));
    let readings = Rc::new(RefCell::new(Vec::new()));
    let readings_inner = Rc::clone(&readings);
    let _sub = registry
        .ph()
        .subscribe_and_fire(move |ph, _| readings_inner.borrow_mut().push((*ph * 100.0).round() / 100.0));

    registry.set_active(SolutionKind::StrongAcid).unwrap();
    registry.set_active(SolutionKind::StrongBase).unwrap();
    registry.set_active(SolutionKind::Water).unwrap();

    assert_eq!(*readings.borrow(), vec![7.0, 2.0, 12.0, 7.0]);
}

#[test]
fn bar_chart_for_active_species() {
    let mut registry = custom();
    registry.select_custom(true, false).unwrap();
    let acid = registry.active_solution();

    let bars: Vec<_> = acid
        .kind()
        .species()
        .iter()
        .map(|species| {
            (
                acid.kind().symbol(*species).unwrap(),
                bar_reading(acid.concentration_of(*species), 100.0),
            )
        })
        .collect();

    let (symbol, solute) = bars[0];
    assert_eq!(symbol, "HA");
    assert_eq!(solute.magnitude, BarMagnitude::Negligible);
    assert_eq!(solute.label.to_string(), "negligible");

    let (symbol, hydronium) = bars[3];
    assert_eq!(symbol, "H3O+");
    assert_eq!(hydronium.label.to_string(), "1.00 x 10^-2");
    assert_eq!(
        acid.concentration_of(Species::Hydronium),
        acid.concentration_of(Species::Product)
    );
}

#[test]
fn contract_violations_are_typed() {
    let mut registry = SolutionRegistry::introduction(Rc::new(AbsConfig::default()));
    assert_eq!(
        registry.set_strength(1e-5),
        Err(ModelError::StrengthNotApplicable {
            kind: SolutionKind::Water
        })
    );
    registry.set_active(SolutionKind::WeakBase).unwrap();
    assert!(matches!(
        registry.set_strength(1e5),
        Err(ModelError::InvalidStrength { .. })
    ));
    assert_eq!("vinegar".parse::<SolutionKind>().unwrap_err().to_string(), "unknown solution 'vinegar'");
}
