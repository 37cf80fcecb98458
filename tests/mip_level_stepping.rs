use ktx_viewer::data::viewport::Viewport;
use ktx_viewer::mipmap::{MipLevelSelection, SamplingBounds, ViewState};
use winit::event::ElementState;
use winit::keyboard::KeyCode;

fn press(view_state: &mut ViewState, key_code: KeyCode, times: usize) {
    for _ in 0..times {
        view_state.handle_keyboard_input(key_code, ElementState::Pressed);
        view_state.handle_keyboard_input(key_code, ElementState::Released);
    }
}

#[test]
fn five_level_texture_saturates_in_both_directions() {
    let mut view_state = ViewState::new(5);
    assert_eq!(view_state.selection().index(), -1);

    press(&mut view_state, KeyCode::ArrowRight, 3);
    assert_eq!(view_state.selection().index(), 2);

    press(&mut view_state, KeyCode::ArrowRight, 10);
    assert_eq!(view_state.selection().index(), 4);
    assert_eq!(
        view_state.sampling_bounds(),
        SamplingBounds {
            base_level: 4,
            max_level: 4
        }
    );

    press(&mut view_state, KeyCode::ArrowLeft, 6);
    assert_eq!(view_state.selection(), MipLevelSelection::Automatic);
    assert_eq!(
        view_state.sampling_bounds(),
        SamplingBounds {
            base_level: 0,
            max_level: 5
        }
    );
}

#[test]
fn viewport_follows_window_resizes() {
    let texture_dimensions = (400, 400);

    let landscape = Viewport::letterbox((800, 600), texture_dimensions);
    let portrait = Viewport::letterbox((400, 800), texture_dimensions);

    assert_eq!((landscape.x, landscape.y), (100, 0));
    assert_eq!((landscape.width, landscape.height), (600, 600));
    assert_eq!((portrait.x, portrait.y), (0, 200));
    assert_eq!((portrait.width, portrait.height), (400, 400));
}
