//! Tests for extracting flat partitions.

mod common;

use std::collections::BTreeMap;

use hdbscan_star::{
    extraction::{fosc_partition, partition_from_clusters, semi_supervised_partition, ExtractionMode},
    propagation::{propagate_tree, Propagation},
    FlatVec,
};
use test_case::test_case;

fn labels(pairs: &[(usize, usize)]) -> BTreeMap<usize, usize> {
    pairs.iter().copied().collect()
}

#[test_case(ExtractionMode::ClassAgnostic; "class_agnostic")]
#[test_case(ExtractionMode::ClassBased; "class_based")]
fn fully_labeled_matches_fosc(mode: ExtractionMode) -> Result<(), String> {
    let data = FlatVec::new_array(common::data_gen::two_line_blobs())?;
    let mut hierarchy = common::hierarchy(&data, 1, 1)?;
    propagate_tree(&mut hierarchy.tree, &Propagation::Unsupervised);
    let fosc = fosc_partition(&hierarchy.tree, &hierarchy.matrix);

    let labeled = labels(&[(0, 0), (1, 0), (2, 0), (3, 1), (4, 1), (5, 1)]);
    let partition = semi_supervised_partition(&mut hierarchy.tree, &hierarchy.matrix, &labeled, mode)?;
    assert_eq!(partition, fosc);
    assert_eq!(hierarchy.tree.root().class_information().len(), 2);
    assert_eq!(hierarchy.tree.get(2).class_information().get(&0), Some(&3));

    Ok(())
}

#[test_case(ExtractionMode::ClassAgnostic, vec![2, 2, 2, 3, 3, 3]; "class_agnostic")]
#[test_case(ExtractionMode::ClassBased, vec![0, 0, 0, 3, 3, 3]; "class_based")]
fn mixed_classes(mode: ExtractionMode, expected: Vec<usize>) -> Result<(), String> {
    let data = FlatVec::new_array(common::data_gen::two_line_blobs())?;
    let mut hierarchy = common::hierarchy(&data, 1, 1)?;

    let labeled = labels(&[(0, 0), (1, 1), (3, 2)]);
    let partition = semi_supervised_partition(&mut hierarchy.tree, &hierarchy.matrix, &labeled, mode)?;
    assert_eq!(partition, expected);
    Ok(())
}

#[test_case(ExtractionMode::ClassAgnostic, vec![4, 4, 4, 5, 5, 5, 3, 3, 3]; "class_agnostic")]
#[test_case(ExtractionMode::ClassBased, vec![2, 2, 2, 2, 2, 2, 3, 3, 3]; "class_based")]
fn frontier_refinement(mode: ExtractionMode, expected: Vec<usize>) -> Result<(), String> {
    let data = FlatVec::new_array(common::data_gen::nested_line_blobs())?;
    let mut hierarchy = common::hierarchy(&data, 1, 1)?;

    let labeled = labels(&[(0, 0), (6, 1)]);
    let partition = semi_supervised_partition(&mut hierarchy.tree, &hierarchy.matrix, &labeled, mode)?;
    assert_eq!(partition, expected);
    Ok(())
}

#[test]
fn bad_labels() -> Result<(), String> {
    let data = FlatVec::new_array(common::data_gen::two_line_blobs())?;
    let mut hierarchy = common::hierarchy(&data, 1, 1)?;
    let mode = ExtractionMode::default();

    assert!(semi_supervised_partition(&mut hierarchy.tree, &hierarchy.matrix, &BTreeMap::new(), mode).is_err());
    assert!(semi_supervised_partition(&mut hierarchy.tree, &hierarchy.matrix, &labels(&[(6, 0)]), mode).is_err());
    Ok(())
}

#[test]
fn root_selection() -> Result<(), String> {
    let data = FlatVec::new_array(common::data_gen::two_line_blobs())?;
    let hierarchy = common::hierarchy(&data, 1, 1)?;

    assert_eq!(partition_from_clusters(&hierarchy.tree, &hierarchy.matrix, &[1]), vec![1; 6]);
    assert_eq!(
        partition_from_clusters(&hierarchy.tree, &hierarchy.matrix, &[3]),
        vec![0, 0, 0, 3, 3, 3]
    );
    Ok(())
}

#[test]
fn random_blobs() -> Result<(), String> {
    let centers = [vec![0.0, 0.0], vec![30.0, 30.0]];
    let data = FlatVec::new_array(common::data_gen::blobs(&centers, 25, 1.0, 17))?;
    let mut hierarchy = common::hierarchy(&data, 4, 5)?;
    propagate_tree(&mut hierarchy.tree, &Propagation::Unsupervised);
    let partition = fosc_partition(&hierarchy.tree, &hierarchy.matrix);

    // No point of one blob shares a label with a point of the other.
    let first = common::distinct_labels(&partition[..25]);
    let second = common::distinct_labels(&partition[25..]);
    assert!(!first.is_empty() && !second.is_empty());
    assert!(first.iter().all(|l| !second.contains(l)));

    Ok(())
}
