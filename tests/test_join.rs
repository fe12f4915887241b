use shared::*;

use geoknn::geometry::{Geometry, Point};
use geoknn::index::BuildParams;
use geoknn::provider::ShapeProvider;
use geoknn::{st_join, Index, JoinHow};
use tracing::info;

#[test]
fn test_inner_join_over_random_point_sets() {
    info!("Starting spatial join integration test");
    let left = points_provider(&pseudo_random_coords(50, 1));
    let right = points_provider(&pseudo_random_coords(400, 2));
    let right_index = Index::build(&right, BuildParams::default()).unwrap();

    let rows: Vec<_> = st_join(&left, &right_index, &right, 3, JoinHow::Inner).collect();
    assert_eq!(rows.len(), 50, "no left row should be dropped when the right side is non-empty");

    for (left_id, top_k) in &rows {
        assert_eq!(top_k, &brute_force_knn(&right, left.get(*left_id), 3));
    }
}

#[test]
fn test_join_row_order_matches_left_provider_order() {
    let left = points_provider(&[(0.0, 0.0), (10.0, 10.0), (20.0, 20.0), (30.0, 30.0)]);
    let right = points_provider(&[(0.0, 0.0), (30.0, 30.0)]);
    let right_index = Index::build(&right, BuildParams::default()).unwrap();

    let ids: Vec<_> = st_join(&left, &right_index, &right, 1, JoinHow::Inner)
        .map(|(id, _)| id)
        .collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);
}

#[test]
fn test_left_join_keeps_rows_with_no_right_candidates() {
    let left = points_provider(&[(0.0, 0.0), (1.0, 1.0)]);
    let right = points_provider(&[]);
    let right_index = Index::build(&right, BuildParams::default()).unwrap();

    let rows: Vec<_> = st_join(&left, &right_index, &right, 4, JoinHow::Left).collect();
    assert_eq!(rows.len(), 2);
    for (_, top_k) in &rows {
        assert!(top_k.is_empty());
    }
}

#[test]
fn test_inner_join_drops_all_rows_when_right_is_empty() {
    let left = points_provider(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
    let right = points_provider(&[]);
    let right_index = Index::build(&right, BuildParams::default()).unwrap();

    let rows: Vec<_> = st_join(&left, &right_index, &right, 4, JoinHow::Inner).collect();
    assert!(rows.is_empty());
}

#[test]
fn test_self_join_k_plus_one_lets_caller_drop_identity_match() {
    let points = points_provider(&pseudo_random_coords(60, 9));
    let index = Index::build(&points, BuildParams::default()).unwrap();

    for (left_id, top_k) in st_join(&points, &index, &points, 4, JoinHow::Inner) {
        assert_eq!(top_k[0].0, left_id, "nearest neighbour of a point set to itself is itself");
        assert_eq!(top_k[0].1, 0.0);
        let without_self: Vec<_> = top_k.into_iter().filter(|(id, _)| *id != left_id).collect();
        assert_eq!(without_self.len(), 3);
    }
}

#[test]
fn test_join_over_mixed_geometry_kinds() {
    use geoknn::geometry::Polygon;

    let left = points_provider(&[(0.0, 0.0), (10.0, 10.0)]);
    let right = geoknn::provider::VecProvider::new(vec![
        Geometry::Point(Point::new(0.1, 0.1)),
        Geometry::Polygon(Polygon::new(vec![
            Point::new(10.0, 10.0),
            Point::new(12.0, 10.0),
            Point::new(12.0, 12.0),
            Point::new(10.0, 12.0),
        ])),
    ]);
    let right_index = Index::build(&right, BuildParams::default()).unwrap();

    let rows: Vec<_> = st_join(&left, &right_index, &right, 1, JoinHow::Inner).collect();
    assert_eq!(rows[0].1[0].0, 0);
    assert_eq!(rows[1].1[0].0, 1);
    assert_eq!(rows[1].1[0].1, 0.0, "point (10,10) coincides with a polygon vertex");
}
