//! Properties of landmarks and traverse paths across every supported board size.

use std::collections::HashSet;

use chowka::{
    BoardSize, EntryPoint, Position, build_traverse_path, compute_landmarks, find_traverse_paths,
};

const SIZES: [usize; 5] = [5, 7, 9, 11, 13];

fn size(n: usize) -> BoardSize {
    BoardSize::new(n).expect("valid size")
}

#[test]
fn test_landmarks_are_distinct_and_on_board() {
    for n in SIZES {
        let landmarks = compute_landmarks(n).expect("valid size");
        let entries: HashSet<Position> = EntryPoint::ALL.iter().map(|e| landmarks.entry(*e)).collect();
        let corners: HashSet<Position> = landmarks.corners().iter().copied().collect();
        assert_eq!(entries.len(), 4, "n = {n}");
        assert_eq!(corners.len(), 4, "n = {n}");

        let board = size(n);
        for pos in entries.iter().chain(corners.iter()) {
            assert!(board.contains(*pos));
        }
        assert!(board.contains(*landmarks.final_pos()));
    }
}

#[test]
fn test_final_cell_is_equidistant_from_entries() {
    for n in SIZES {
        let landmarks = compute_landmarks(n).expect("valid size");
        let distances: HashSet<usize> = EntryPoint::ALL
            .iter()
            .map(|e| landmarks.entry(*e).chebyshev(*landmarks.final_pos()))
            .collect();
        assert_eq!(distances, HashSet::from([(n - 1) / 2]));
    }
}

#[test]
fn test_paths_visit_every_cell_but_the_final_once() {
    for n in SIZES {
        let landmarks = compute_landmarks(n).expect("valid size");
        for entry in EntryPoint::ALL {
            let path = build_traverse_path(size(n), entry);
            let distinct: HashSet<Position> = path.cells().iter().copied().collect();
            assert_eq!(distinct.len(), path.len(), "duplicate cell, n = {n}, {entry}");
            assert_eq!(path.len(), n * n - 1, "n = {n}, {entry}");
            assert!(!path.contains(*landmarks.final_pos()));
            assert!(path.cells().iter().all(|pos| size(n).contains(*pos)));
        }
    }
}

#[test]
fn test_paths_are_connected_and_end_next_to_the_final_cell() {
    for n in SIZES {
        let landmarks = compute_landmarks(n).expect("valid size");
        for entry in EntryPoint::ALL {
            let path = build_traverse_path(size(n), entry);
            assert_eq!(path.cells()[0], landmarks.entry(entry));
            for pair in path.cells().windows(2) {
                assert_eq!(pair[0].chebyshev(pair[1]), 1, "gap between {} and {}", pair[0], pair[1]);
            }
            let last = path.last().expect("non-empty path");
            assert_eq!(last.chebyshev(*landmarks.final_pos()), 1);
        }
    }
}

#[test]
fn test_outer_ring_comes_first() {
    for n in SIZES {
        let path = build_traverse_path(size(n), EntryPoint::Top);
        let on_edge = |pos: &Position| pos.row == 0 || pos.col == 0 || pos.row == n - 1 || pos.col == n - 1;
        let outer = 4 * (n - 1);
        assert!(path.cells()[..outer].iter().all(on_edge));
        assert!(!path.cells()[outer..].iter().any(on_edge));
    }
}

#[test]
fn test_paths_are_rotations_of_the_top_path() {
    for n in SIZES {
        let board = size(n);
        let top = build_traverse_path(board, EntryPoint::Top);
        for entry in EntryPoint::ALL {
            let rotated: Vec<Position> = top
                .cells()
                .iter()
                .map(|pos| pos.rotate(board, entry.quarter_turns()))
                .collect();
            assert_eq!(build_traverse_path(board, entry).cells(), rotated.as_slice(), "n = {n}, {entry}");
        }
    }
}

#[test]
fn test_paths_are_deterministic() {
    let board = size(9);
    let landmarks = compute_landmarks(9).expect("valid size");
    let first = find_traverse_paths(board, &landmarks);
    let second = find_traverse_paths(board, &landmarks);
    assert_eq!(first, second);
    assert_eq!(*first.get(EntryPoint::Bottom), build_traverse_path(board, EntryPoint::Bottom));
}
