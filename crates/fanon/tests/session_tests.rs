use std::collections::BTreeMap;

use fanon::{
    ANY_VALUE, AnonError, Anonymity, Attribute, AttributeType, DataDefinition, DataHandle,
    DataSelector, DataSource, DataSubset, DataType, HandleRef, Hierarchy, InformationLoss,
    LossRange, Session, SessionConfig,
};

fn definition() -> DataDefinition {
    DataDefinition::new(vec![
        Attribute::new("age", DataType::Integer, AttributeType::QuasiIdentifying),
        Attribute::new("zip", DataType::String, AttributeType::QuasiIdentifying),
        Attribute::new("disease", DataType::String, AttributeType::Sensitive),
    ])
}

fn hierarchies() -> BTreeMap<String, Hierarchy> {
    let age = Hierarchy::from_rows(&[
        &["17", "10-19", "*"],
        &["18", "10-19", "*"],
        &["34", "30-39", "*"],
        &["38", "30-39", "*"],
        &["64", "60-69", "*"],
    ])
    .expect("age hierarchy");
    let zip = Hierarchy::from_rows(&[
        &["47677", "4767*"],
        &["47678", "4767*"],
        &["47905", "4790*"],
    ])
    .expect("zip hierarchy");
    BTreeMap::from([("age".to_owned(), age), ("zip".to_owned(), zip)])
}

fn source() -> DataSource {
    DataSource::from_strings(
        &["age", "zip", "disease"],
        &[
            vec!["34", "47677", "flu"],
            vec!["17", "47905", "cancer"],
            vec!["64", "47678", "flu"],
            vec!["18", "47677", "asthma"],
            vec!["38", "47905", "cancer"],
        ],
    )
}

fn open() -> Session {
    Session::open(source(), definition(), &hierarchies(), SessionConfig::default())
        .expect("session opens")
}

fn column(session: &Session, handle: HandleRef, column: usize) -> Vec<String> {
    let view = session.view(handle).expect("view");
    (0..view.num_rows())
        .map(|row| view.value(row, column).expect("cell").to_owned())
        .collect()
}

#[test]
fn lattice_spans_quasi_identifier_hierarchies() {
    let session = open();
    assert_eq!(session.quasi_identifiers(), &[0, 1]);
    // age has levels 0..=2, zip 0..=1.
    assert_eq!(session.lattice().size(), 6);
    assert_eq!(session.lattice().heights(), &[2, 1]);
}

#[test]
fn outputs_follow_input_sorts() {
    let mut session = open();
    let node = session.find(&[1, 1]).expect("node");
    session.transform(node, &[]).expect("transform");

    session.sort(HandleRef::Input, true, &[0]).expect("sort input");
    assert_eq!(
        column(&session, HandleRef::Input, 0),
        ["17", "18", "34", "38", "64"]
    );
    assert_eq!(
        column(&session, HandleRef::Output(node), 0),
        ["10-19", "10-19", "30-39", "30-39", "60-69"]
    );
    assert_eq!(
        column(&session, HandleRef::Output(node), 2),
        column(&session, HandleRef::Input, 2)
    );

    session
        .sort(HandleRef::Output(node), false, &[1, 2])
        .expect("sort output");
    let input_zip = column(&session, HandleRef::Input, 1);
    let output_zip = column(&session, HandleRef::Output(node), 1);
    for (original, generalized) in input_zip.iter().zip(&output_zip) {
        assert_eq!(&original[..4], &generalized[..4]);
    }
    assert_eq!(output_zip[0], "4790*");
}

#[test]
fn suppressed_rows_decode_to_any() {
    let mut session = open();
    let node = session.find(&[0, 0]).expect("bottom");
    session.transform(node, &[1]).expect("transform");
    let view = session.view(HandleRef::Output(node)).expect("output");
    assert!(view.is_outlier(1).expect("row"));
    assert_eq!(view.value(1, 0).expect("cell"), ANY_VALUE);
    assert_eq!(view.value(1, 2).expect("cell"), "cancer");
    assert!(!session
        .view(HandleRef::Input)
        .expect("input")
        .is_outlier(1)
        .expect("row"));
}

#[test]
fn population_subsets_track_registry_swaps() {
    let mut session = open();
    let node = session.find(&[2, 1]).expect("top");
    session.transform(node, &[]).expect("transform");

    let subset = {
        let input = session.view(HandleRef::Input).expect("input");
        let mut selector = DataSelector::new(&input).field("disease").equals("cancer");
        DataSubset::from_selector(&mut selector, session.interrupt(), 2).expect("subset")
    };
    assert_eq!(subset.sorted_indices(), &[1, 4]);
    session.set_population(&subset).expect("population");
    assert_eq!(
        column(&session, HandleRef::InputSubset, 0),
        ["17", "38"]
    );

    session.swap(HandleRef::Input, 0, 1).expect("swap");
    assert_eq!(
        column(&session, HandleRef::InputSubset, 0),
        ["17", "38"]
    );
    assert_eq!(
        session
            .view(HandleRef::InputSubset)
            .expect("subset")
            .subset_indices(),
        Some(&[0, 4][..])
    );

    session
        .sort(HandleRef::OutputSubset(node), true, &[0])
        .expect("sort subset");
    assert_eq!(column(&session, HandleRef::OutputSubset(node), 0), ["*", "*"]);
    assert_eq!(
        column(&session, HandleRef::OutputSubset(node), 2),
        ["cancer", "cancer"]
    );
}

#[test]
fn exact_match_population() {
    let session = open();
    let query = Session::open(
        DataSource::from_strings(&["age", "zip", "disease"], &[vec!["64", "47678", "flu"]]),
        definition(),
        &hierarchies(),
        SessionConfig::default(),
    )
    .expect("query session");
    let background = session.view(HandleRef::Input).expect("background");
    let candidates = query.view(HandleRef::Input).expect("query");
    let subset = DataSubset::from_matching(&background, &candidates).expect("match");
    assert_eq!(subset.sorted_indices(), &[2]);
}

#[test]
fn bound_estimation_through_session() {
    let config = SessionConfig {
        loss_range: LossRange::new(0.0, 100.0),
        ..SessionConfig::default()
    };
    let mut session = Session::open(source(), definition(), &hierarchies(), config)
        .expect("session opens");
    let bottom = session.lattice().bottom();
    let top = session.lattice().top();
    let mid = session.find(&[1, 0]).expect("mid");

    for node in [mid, top] {
        session
            .report_anonymity(node, Anonymity::Anonymous)
            .expect("anonymity");
    }
    session
        .report_anonymity(bottom, Anonymity::NotAnonymous)
        .expect("anonymity");
    session
        .report_information_loss(mid, Some(InformationLoss::new(12.0)), None, None)
        .expect("loss");
    session
        .report_information_loss(top, Some(InformationLoss::new(80.0)), None, None)
        .expect("loss");
    session.estimate();

    let above = session.find(&[2, 0]).expect("node above mid");
    let node = session.lattice().node(above).expect("node");
    assert!(node.minimum().expect("minimum") >= InformationLoss::new(12.0));
    assert!(node.maximum().expect("maximum") <= InformationLoss::new(100.0));
    assert_eq!(session.global_maximum(), Some(InformationLoss::new(100.0)));
    assert!(session.global_minimum().is_some());
}

#[test]
fn close_releases_everything() {
    let mut session = open();
    let node = session.find(&[1, 0]).expect("node");
    session.transform(node, &[]).expect("transform");
    session.close().expect("close");
    assert!(matches!(
        session.view(HandleRef::Output(node)),
        Err(AnonError::HandleReleased)
    ));
    assert!(matches!(
        session.transform(node, &[]),
        Err(AnonError::HandleReleased)
    ));
    // Bounds outlive the handles.
    assert_eq!(session.lattice().size(), 6);
    session.close().expect("closing twice is harmless");
}

#[test]
fn released_output_fails_with_handle_released() {
    let mut session = open();
    let node = session.find(&[1, 1]).expect("node");
    session.transform(node, &[]).expect("transform");
    session.release(HandleRef::Output(node)).expect("release");

    assert!(matches!(
        session.view(HandleRef::Output(node)),
        Err(AnonError::HandleReleased)
    ));
    assert!(matches!(
        session.sort(HandleRef::Output(node), true, &[0]),
        Err(AnonError::HandleReleased)
    ));
    let never = session.find(&[2, 0]).expect("node");
    assert!(matches!(
        session.view(HandleRef::Output(never)),
        Err(AnonError::NoSuchHandle)
    ));

    session.transform(node, &[]).expect("transform again");
    assert_eq!(column(&session, HandleRef::Output(node), 1)[0], "4767*");
}

#[test]
fn distinct_values_and_interrupt() {
    let session = open();
    assert_eq!(
        session.distinct_values(HandleRef::Input, 0).expect("distinct"),
        ["17", "18", "34", "38", "64"]
    );
    session.interrupt().cancel();
    assert!(matches!(
        session.distinct_values(HandleRef::Input, 2),
        Err(AnonError::Interrupted)
    ));
}

#[test]
fn open_validates_inputs() {
    let mut missing = hierarchies();
    missing.remove("zip");
    assert!(matches!(
        Session::open(source(), definition(), &missing, SessionConfig::default()),
        Err(AnonError::InvalidLattice { .. })
    ));

    let wrong_header = DataSource::from_strings(&["age", "zip"], &[vec!["17", "47677"]]);
    assert!(matches!(
        Session::open(wrong_header, definition(), &hierarchies(), SessionConfig::default()),
        Err(AnonError::RowWidthMismatch { .. })
    ));

    let empty = DataSource::new(
        vec!["age".to_owned(), "zip".to_owned(), "disease".to_owned()],
        Vec::new(),
    );
    assert!(matches!(
        Session::open(empty, definition(), &hierarchies(), SessionConfig::default()),
        Err(AnonError::EmptyInput)
    ));

    let unknown_value = DataSource::from_strings(
        &["age", "zip", "disease"],
        &[vec!["99", "47677", "flu"]],
    );
    let mut session =
        Session::open(unknown_value, definition(), &hierarchies(), SessionConfig::default())
            .expect("values outside hierarchies are accepted at open");
    let node = session.find(&[1, 0]).expect("node");
    assert!(matches!(
        session.transform(node, &[]),
        Err(AnonError::HierarchyMissingValue { .. })
    ));
}

#[test]
fn custom_null_token() {
    let config = SessionConfig {
        null_token: "?".to_owned(),
        ..SessionConfig::default()
    };
    let source = DataSource::new(
        vec!["age".to_owned(), "zip".to_owned(), "disease".to_owned()],
        vec![
            vec![Some("17".to_owned()), Some("47677".to_owned()), None],
            vec![Some("18".to_owned()), Some("47678".to_owned())],
        ],
    );
    let session =
        Session::open(source, definition(), &hierarchies(), config).expect("session opens");
    let input = session.view(HandleRef::Input).expect("input");
    assert_eq!(input.value(0, 2).expect("cell"), "?");
    assert_eq!(input.value(1, 2).expect("cell"), "?");
}

proptest::proptest! {
    #![proptest_config(proptest::prelude::ProptestConfig::with_cases(64))]

    #[test]
    fn prop_every_output_row_generalizes_its_input_row(
        sorts in proptest::collection::vec((0usize..3, 0usize..3, proptest::prelude::any::<bool>()), 1..12),
    ) {
        let hierarchies = hierarchies();
        let mut session = open();
        let nodes = [[1, 0], [1, 1], [2, 1]]
            .iter()
            .map(|levels| session.find(levels).expect("node"))
            .collect::<Vec<_>>();
        for &node in &nodes {
            session.transform(node, &[]).expect("transform");
        }

        for (target, column, ascending) in sorts {
            let handle = if target == 0 { HandleRef::Input } else { HandleRef::Output(nodes[target]) };
            session.sort(handle, ascending, &[column]).expect("sort");

            let input = session.view(HandleRef::Input).expect("input");
            for &node in &nodes {
                let output = session.view(HandleRef::Output(node)).expect("output");
                let levels = session.lattice().node(node).expect("node").transformation().to_vec();
                for row in 0..input.num_rows() {
                    for (column, name) in ["age", "zip"].iter().enumerate() {
                        let expected = hierarchies[*name]
                            .generalize(column, input.value(row, column).expect("cell"), levels[column])
                            .expect("generalize");
                        proptest::prop_assert_eq!(output.value(row, column).expect("cell"), expected);
                    }
                    proptest::prop_assert_eq!(
                        output.value(row, 2).expect("cell"),
                        input.value(row, 2).expect("cell")
                    );
                }
            }
        }
    }
}
