mod common;

use common::{approx, grid_with_cells, settle};
use photo_grid::grid::ViewState;
use photo_grid::widget::{Direction, InputEvent, Key};

#[test]
fn arrows_then_down_lands_on_middle_row_without_scrolling() {
    let mut grid = grid_with_cells(300, 200, 3, 2, 9, 30);
    for key in [Key::Right, Key::Right, Key::Down] {
        assert!(grid.handle_event(&InputEvent::KeyPress(key)));
    }

    assert_eq!(grid.active_index(), Some(5));
    assert_eq!(grid.row_offset(), 0);
    assert_eq!(grid.state(), ViewState::Browse);
    assert_eq!(grid.active_tickers(), 0);
}

#[test]
fn moves_stop_at_the_edges() {
    let mut grid = grid_with_cells(300, 200, 3, 2, 5, 30);

    grid.navigate(Direction::West);
    grid.navigate(Direction::North);
    assert_eq!(grid.active_index(), Some(0));

    for _ in 0..10 {
        grid.navigate(Direction::East);
    }
    assert_eq!(grid.active_index(), Some(4));

    assert!(grid.set_active_cell(2));
    grid.navigate(Direction::South);
    assert_eq!(grid.active_index(), Some(2), "no cell below index 2");

    grid.navigate(Direction::West);
    grid.navigate(Direction::South);
    assert_eq!(grid.active_index(), Some(4));
    assert_eq!(grid.row_offset(), 0);
    assert_eq!(grid.active_tickers(), 0);
}

#[test]
fn rejected_move_leaves_everything_untouched() {
    let mut grid = grid_with_cells(300, 200, 3, 2, 4, 30);
    grid.take_paint_request();
    let camera = *grid.camera();

    grid.navigate(Direction::North);

    assert_eq!(grid.active_index(), Some(0));
    assert_eq!(*grid.camera(), camera);
    assert!(!grid.take_paint_request());
}

#[test]
fn scrolling_follows_the_active_row() {
    let mut grid = grid_with_cells(300, 200, 3, 2, 12, 30);
    let (_, cell_h) = grid.cell_size();

    grid.navigate(Direction::South);
    assert_eq!((grid.active_index(), grid.row_offset()), (Some(3), 0));
    assert_eq!(grid.state(), ViewState::Browse);

    grid.navigate(Direction::South);
    assert_eq!((grid.active_index(), grid.row_offset()), (Some(6), 1));
    assert_eq!(grid.state(), ViewState::ScrolledMove);
    assert!(approx(grid.camera().scroll_dist, -(cell_h as f32)));
    assert_eq!(grid.active_tickers(), 1);
    settle(&mut grid);

    grid.navigate(Direction::South);
    assert_eq!(grid.row_offset(), 2);
    settle(&mut grid);

    grid.navigate(Direction::North);
    assert_eq!((grid.active_index(), grid.row_offset()), (Some(6), 2));

    grid.navigate(Direction::North);
    assert_eq!((grid.active_index(), grid.row_offset()), (Some(3), 1));
    assert!(approx(grid.camera().scroll_dist, cell_h as f32));
}

#[test]
fn row_offset_changes_by_at_most_one_and_only_when_offscreen() {
    let (cols, rows) = (4, 2);
    let mut grid = grid_with_cells(400, 200, cols, rows, 27, 30);
    let pattern = [
        Direction::South,
        Direction::South,
        Direction::East,
        Direction::South,
        Direction::South,
        Direction::East,
        Direction::North,
        Direction::West,
        Direction::South,
        Direction::South,
        Direction::South,
        Direction::North,
        Direction::North,
        Direction::North,
        Direction::North,
        Direction::West,
        Direction::North,
    ];

    for direction in pattern.iter().cycle().take(120) {
        let before = grid.row_offset();
        grid.navigate(*direction);
        let idx = grid.active_index().unwrap();
        let after = grid.row_offset();

        let first = before * cols;
        let was_visible = idx >= first && idx < first + cols * rows;
        assert!(before.abs_diff(after) <= 1, "{before} -> {after}");
        assert_eq!(was_visible, before == after, "idx {idx} offset {before}");

        let now_first = after * cols;
        assert!(idx >= now_first && idx < now_first + cols * rows);
        settle(&mut grid);
    }
}

#[test]
fn navigation_sets_the_zoom_target() {
    let mut grid = grid_with_cells(300, 300, 3, 3, 9, 30);
    grid.navigate(Direction::East);
    grid.navigate(Direction::South);

    let camera = grid.camera();
    assert!(approx(camera.view_max_x, -100.0 * 3.0));
    assert!(approx(camera.view_max_y, -100.0 * 3.0));
}

#[test]
fn moving_while_zoomed_pans_between_cells() {
    let mut grid = grid_with_cells(300, 300, 3, 3, 9, 30);
    grid.activate();
    settle(&mut grid);
    assert_eq!(grid.state(), ViewState::Zoomed);
    let tickers = grid.active_tickers();

    grid.navigate(Direction::East);
    assert_eq!(grid.state(), ViewState::ZoomedMove);
    assert_eq!(grid.anim_step(), 0);
    assert_eq!(grid.active_tickers(), tickers + 1);
    let camera = *grid.camera();
    assert!(approx(camera.view_min_x, 0.0));
    assert!(approx(camera.view_max_x, -300.0));

    let ticks = settle(&mut grid);
    assert_eq!(ticks, 10);
    assert_eq!(grid.state(), ViewState::Zoomed);
    assert!(approx(grid.paint_params().trans_x, -300.0));
}

#[test]
fn zoomed_scroll_arms_a_single_ticker() {
    let mut grid = grid_with_cells(300, 100, 3, 1, 6, 30);
    grid.activate();
    settle(&mut grid);
    let tickers = grid.active_tickers();

    grid.navigate(Direction::South);

    assert_eq!(grid.row_offset(), 1);
    assert_eq!(grid.state(), ViewState::ZoomedMove);
    assert_eq!(grid.active_tickers(), tickers + 1);
}

#[test]
fn unknown_keys_and_releases_are_not_consumed() {
    let mut grid = grid_with_cells(300, 200, 3, 2, 6, 30);
    assert!(!grid.handle_event(&InputEvent::KeyPress(Key::Other("Space".into()))));
    assert!(!grid.handle_event(&InputEvent::KeyRelease(Key::Right)));
    assert_eq!(grid.active_index(), Some(0));

    assert!(grid.handle_event(&InputEvent::KeyPress(Key::KeypadRight)));
    assert_eq!(grid.active_index(), Some(1));
}

#[test]
fn navigating_an_empty_grid_is_a_no_op() {
    let mut grid = grid_with_cells(300, 200, 3, 2, 0, 30);
    grid.navigate(Direction::East);
    assert_eq!(grid.active_index(), None);
    assert!(grid.get_active_cell().is_none());
}

#[test]
fn scroll_during_zoomed_pan_settles_in_the_browse_view() {
    let mut grid = grid_with_cells(300, 200, 3, 2, 12, 30);
    grid.navigate(Direction::South);
    grid.activate();
    settle(&mut grid);

    grid.navigate(Direction::East);
    assert_eq!(grid.state(), ViewState::ZoomedMove);
    grid.navigate(Direction::South);
    assert_eq!(grid.active_index(), Some(7));
    assert_eq!(grid.state(), ViewState::ScrolledMove);
    assert!(approx(grid.camera().view_min_x, 0.0));
    assert!(approx(grid.camera().view_min_y, 0.0));

    settle(&mut grid);

    assert_eq!(grid.state(), ViewState::Browse);
    assert_eq!(grid.row_offset(), 1);
    let p = *grid.paint_params();
    assert!(approx(p.zoom, 1.0));
    assert!(approx(p.trans_x, 0.0));
    assert!(approx(p.trans_y, -100.0));
    assert_eq!((p.start_y, p.first_cell), (100, 3));
}

#[test]
fn set_active_cell_retargets_the_zoom() {
    let mut grid = grid_with_cells(300, 300, 3, 3, 9, 30);
    assert!(grid.set_active_cell(4));
    assert!(approx(grid.camera().view_max_x, -300.0));
    assert!(approx(grid.camera().view_max_y, -300.0));

    grid.activate();
    settle(&mut grid);
    let p = *grid.paint_params();
    assert!(approx(p.zoom, 3.0));
    assert!(approx(p.trans_x, -300.0));
    assert!(approx(p.trans_y, -300.0));

    grid.take_paint_request();
    assert!(grid.set_active_cell(0));
    assert_eq!(grid.state(), ViewState::Zoomed);
    assert!(grid.take_paint_request());
    let p = *grid.paint_params();
    assert!(approx(p.trans_x, 0.0));
    assert!(approx(p.trans_y, 0.0));
}
