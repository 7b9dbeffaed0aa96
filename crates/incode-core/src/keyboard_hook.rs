//! Windows low-level keyboard hook, `SendInput` output and monitor geometry.

use crate::runtime::SharedEngine;
use crate::sink::{DisplayGeometry, OutputSink};
use crate::types::{KeyAction, KeyEdge, KeyEvent, MouseButton, Point, Rect, ScKey};
use parking_lot::Mutex;
use std::time::Instant;
use tracing::{error, info};
use windows::Win32::Foundation::{HINSTANCE, LPARAM, LRESULT, POINT, WPARAM};
use windows::Win32::Graphics::Gdi::{
    GetMonitorInfoW, MonitorFromPoint, MONITORINFO, MONITOR_DEFAULTTONEAREST,
};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYEVENTF_KEYUP,
    KEYEVENTF_UNICODE, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP, MOUSEEVENTF_RIGHTDOWN,
    MOUSEEVENTF_RIGHTUP, MOUSEEVENTF_WHEEL, MOUSEINPUT, MOUSE_EVENT_FLAGS, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, DispatchMessageW, GetCursorPos, GetMessageW, PeekMessageW, SetCursorPos,
    SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, HHOOK, KBDLLHOOKSTRUCT,
    LLKHF_EXTENDED, LLKHF_INJECTED, MSG, WH_KEYBOARD_LL, WHEEL_DELTA, WM_KEYUP, WM_SYSKEYUP,
};

/// Magic number to identify our own injected events.
const INJECTED_EXTRA_INFO: usize = 0xFFC3C3C3;

lazy_static::lazy_static! {
    static ref HOOKED_ENGINE: Mutex<Option<SharedEngine>> = Mutex::new(None);
}

static HOOK_HANDLE: Mutex<Option<HHOOK>> = parking_lot::const_mutex(None);

/// Starts the keyboard hook, routing every key event into `engine`.
/// This must be called from a thread that pumps messages (see `run_event_loop`).
pub fn install_hook(engine: SharedEngine) -> anyhow::Result<()> {
    info!("Installing keyboard hook...");
    *HOOKED_ENGINE.lock() = Some(engine);

    let hook_id =
        unsafe { SetWindowsHookExW(WH_KEYBOARD_LL, Some(hook_proc), HINSTANCE::default(), 0) }?;
    if hook_id.is_invalid() {
        return Err(anyhow::anyhow!("Failed to install hook"));
    }

    *HOOK_HANDLE.lock() = Some(hook_id);
    info!("Keyboard hook installed. Handle: {:?}", hook_id);
    Ok(())
}

pub fn uninstall_hook() {
    if let Some(h) = HOOK_HANDLE.lock().take() {
        unsafe {
            let _ = UnhookWindowsHookEx(h);
        };
        info!("Keyboard hook uninstalled.");
    }
    *HOOKED_ENGINE.lock() = None;
}

/// Runs a blocking message loop.
pub fn run_event_loop() {
    info!("Starting message loop...");
    let mut msg = MSG::default();
    unsafe {
        // Force message queue creation
        let _ = PeekMessageW(
            &mut msg,
            None,
            0,
            0,
            windows::Win32::UI::WindowsAndMessaging::PEEK_MESSAGE_REMOVE_TYPE(0),
        );

        while GetMessageW(&mut msg, None, 0, 0).as_bool() {
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
    info!("Message loop exited.");
}

unsafe extern "system" fn hook_proc(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code < 0 {
        return CallNextHookEx(None, code, wparam, lparam);
    }

    let kbd = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
    let msg = wparam.0 as u32;
    let up = msg == WM_KEYUP || msg == WM_SYSKEYUP;
    let ext = (kbd.flags.0 & LLKHF_EXTENDED.0) != 0;
    let injected = (kbd.flags.0 & LLKHF_INJECTED.0) != 0;

    let event = KeyEvent {
        key: ScKey::new(kbd.scanCode as u16, ext),
        edge: if up { KeyEdge::Up } else { KeyEdge::Down },
        injected,
        t: Instant::now(),
    };

    let engine = HOOKED_ENGINE.lock().clone();
    let action = match engine {
        Some(engine) => engine.lock().process_key(event),
        None => KeyAction::Pass,
    };

    match action {
        KeyAction::Pass => CallNextHookEx(None, code, wparam, lparam),
        KeyAction::Block => LRESULT(1),
    }
}

fn send(inputs: &[INPUT]) -> anyhow::Result<()> {
    let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        return Err(anyhow::anyhow!(
            "SendInput accepted {} of {} events",
            sent,
            inputs.len()
        ));
    }
    Ok(())
}

fn mouse_input(flags: MOUSE_EVENT_FLAGS, data: i32) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx: 0,
                dy: 0,
                mouseData: data,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: INJECTED_EXTRA_INFO,
            },
        },
    }
}

fn unicode_input(code_unit: u16, up: bool) -> INPUT {
    let mut flags = KEYEVENTF_UNICODE;
    if up {
        flags |= KEYEVENTF_KEYUP;
    }
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(0),
                wScan: code_unit,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: INJECTED_EXTRA_INFO,
            },
        },
    }
}

/// Output through `SetCursorPos` and `SendInput`.
#[derive(Debug, Default)]
pub struct SendInputSink;

impl OutputSink for SendInputSink {
    fn move_cursor_to(&mut self, x: i32, y: i32) -> anyhow::Result<()> {
        unsafe { SetCursorPos(x, y) }?;
        Ok(())
    }

    fn scroll_vertical(&mut self, amount: i32) -> anyhow::Result<()> {
        send(&[mouse_input(MOUSEEVENTF_WHEEL, amount * WHEEL_DELTA as i32)])
    }

    fn button_down(&mut self, button: MouseButton) -> anyhow::Result<()> {
        let flags = match button {
            MouseButton::Left => MOUSEEVENTF_LEFTDOWN,
            MouseButton::Right => MOUSEEVENTF_RIGHTDOWN,
        };
        send(&[mouse_input(flags, 0)])
    }

    fn button_up(&mut self, button: MouseButton) -> anyhow::Result<()> {
        let flags = match button {
            MouseButton::Left => MOUSEEVENTF_LEFTUP,
            MouseButton::Right => MOUSEEVENTF_RIGHTUP,
        };
        send(&[mouse_input(flags, 0)])
    }

    fn inject_text(&mut self, text: &str) -> anyhow::Result<()> {
        let mut inputs = Vec::with_capacity(text.len() * 2);
        for c in text.chars() {
            let mut buf = [0; 2];
            for code_unit in c.encode_utf16(&mut buf) {
                inputs.push(unicode_input(*code_unit, false));
                inputs.push(unicode_input(*code_unit, true));
            }
        }
        send(&inputs)
    }
}

/// Cursor position and monitor work areas from user32.
#[derive(Debug, Default)]
pub struct Win32Display;

impl DisplayGeometry for Win32Display {
    fn cursor_position(&self) -> Point {
        let mut p = POINT::default();
        match unsafe { GetCursorPos(&mut p) } {
            Ok(()) => Point::new(p.x, p.y),
            Err(e) => {
                error!("GetCursorPos failed: {}", e);
                Point::default()
            }
        }
    }

    fn display_bounds(&self, at: Point) -> Rect {
        let mut info = MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        let ok = unsafe {
            let monitor = MonitorFromPoint(POINT { x: at.x, y: at.y }, MONITOR_DEFAULTTONEAREST);
            GetMonitorInfoW(monitor, &mut info).as_bool()
        };
        if !ok {
            error!("GetMonitorInfoW failed for {:?}", at);
            return Rect::default();
        }
        let r = info.rcWork;
        Rect::new(r.left, r.top, r.right - r.left, r.bottom - r.top)
    }
}
