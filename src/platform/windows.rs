//! Windows implementation
//!
//! Win32 surface behind [`Desktop`]: monitor enumeration, monitor-from-point,
//! absolute cursor moves, plus the dispatcher that owns the low-level mouse
//! hook, the hidden carrier window for display-change notifications, and the
//! topology check timer.
//!
//! Requirements:
//! - The hook thread must pump messages; WH_MOUSE_LL callbacks arrive there.
//! - Per-monitor DPI awareness v2 must be declared before enumeration so all
//!   rectangles are physical pixels on the virtual desktop.

use std::cell::Cell;
use std::ptr;
use std::sync::atomic::{AtomicU32, Ordering};

use windows::core::PCWSTR;
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, POINT, RECT, TRUE, WPARAM};
use windows::Win32::Graphics::Gdi::{
    EnumDisplayMonitors, GetMonitorInfoW, MonitorFromPoint, HDC, HMONITOR, MONITORINFOEXW,
    MONITORINFOF_PRIMARY, MONITOR_DEFAULTTONULL,
};
use windows::Win32::System::Console::SetConsoleCtrlHandler;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::HiDpi::{
    SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
    KillTimer, PostQuitMessage, PostThreadMessageW, RegisterClassW, SetCursorPos, SetTimer,
    SetWindowsHookExW, TranslateMessage, UnhookWindowsHookEx, HC_ACTION, LLMHF_INJECTED, MSG,
    MSLLHOOKSTRUCT, WH_MOUSE_LL, WINDOW_EX_STYLE, WM_CLOSE, WM_DISPLAYCHANGE, WM_MOUSEMOVE,
    WM_QUIT, WM_SETTINGCHANGE, WM_TIMER, WNDCLASSW, WS_POPUP,
};

use super::{Desktop, PlatformError, PlatformResult};
use crate::geometry::{Point, Rect};
use crate::hook::{CrossingPipeline, Disposition};
use crate::topology::{Monitor, MonitorId};

const HIDDEN_CLASS_NAME: &str = "EdgeGlideHidden";
const TOPOLOGY_TIMER_ID: usize = 1;
const TOPOLOGY_INTERVAL_MS: u32 = 30_000;

/// Dispatcher thread id, written once before the console handler is
/// registered; the handler runs on a separate OS thread and only posts
/// WM_QUIT here.
static DISPATCHER_THREAD_ID: AtomicU32 = AtomicU32::new(0);

/// Everything the hook callback and the window procedure operate on.
struct HookRuntime {
    pipeline: CrossingPipeline,
    desktop: WinDesktop,
}

thread_local! {
    /// Set while the dispatcher runs; the hook callback has no user-context
    /// parameter, so it reaches the runtime through this pointer.
    static RUNTIME: Cell<*mut HookRuntime> = const { Cell::new(ptr::null_mut()) };
    /// Guards against handing the runtime out twice when SetCursorPos
    /// re-enters the hook synchronously within one callback frame.
    static IN_CALLBACK: Cell<bool> = const { Cell::new(false) };
}

/// Declares this process per-monitor DPI aware (v2).
///
/// Without this Windows virtualizes coordinates against the primary
/// monitor's DPI and mixed-DPI rectangles come back wrong. Failure is
/// ignored: the context may already be set through an application manifest.
pub fn set_dpi_awareness() {
    // SAFETY: plain process-wide mode switch, called once at startup.
    unsafe {
        let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
    }
}

/// The real desktop, backed by Win32.
pub struct WinDesktop;

impl Desktop for WinDesktop {
    fn enumerate(&self) -> Vec<Monitor> {
        // SAFETY: called by Windows once per monitor during the
        // EnumDisplayMonitors call below; lparam is the Vec we pass in.
        unsafe extern "system" fn enum_proc(
            hmonitor: HMONITOR,
            _hdc: HDC,
            _rect: *mut RECT,
            lparam: LPARAM,
        ) -> windows::Win32::Foundation::BOOL {
            let monitors = &mut *(lparam.0 as *mut Vec<Monitor>);

            let mut info = MONITORINFOEXW::default();
            info.monitorInfo.cbSize = std::mem::size_of::<MONITORINFOEXW>() as u32;
            if GetMonitorInfoW(hmonitor, &mut info.monitorInfo).as_bool() {
                let rc = info.monitorInfo.rcMonitor;
                monitors.push(Monitor {
                    id: MonitorId::from_raw(hmonitor.0 as isize),
                    rect: Rect::new(rc.left, rc.top, rc.right, rc.bottom),
                    primary: (info.monitorInfo.dwFlags & MONITORINFOF_PRIMARY) != 0,
                    device: device_name(&info.szDevice),
                });
            }
            TRUE
        }

        let mut monitors: Vec<Monitor> = Vec::new();
        // SAFETY: the Vec outlives the synchronous enumeration.
        unsafe {
            let _ = EnumDisplayMonitors(
                None,
                None,
                Some(enum_proc),
                LPARAM(&mut monitors as *mut Vec<Monitor> as isize),
            );
        }
        monitors
    }

    fn monitor_at(&self, point: Point) -> Option<MonitorId> {
        let pt = POINT {
            x: point.x,
            y: point.y,
        };
        // SAFETY: pure query.
        let hmonitor = unsafe { MonitorFromPoint(pt, MONITOR_DEFAULTTONULL) };
        if hmonitor.is_invalid() {
            None
        } else {
            Some(MonitorId::from_raw(hmonitor.0 as isize))
        }
    }

    fn warp_cursor(&mut self, point: Point) -> PlatformResult<()> {
        // SAFETY: absolute cursor move; no pointers involved.
        unsafe { SetCursorPos(point.x, point.y) }
            .map_err(|e| PlatformError::CursorMove(e.to_string()))
    }
}

/// Enumerates the current monitors, for the `info` diagnostics path.
pub fn monitors() -> PlatformResult<Vec<Monitor>> {
    set_dpi_awareness();
    let monitors = WinDesktop.enumerate();
    if monitors.is_empty() {
        return Err(PlatformError::NoMonitors);
    }
    Ok(monitors)
}

fn device_name(sz: &[u16]) -> String {
    let len = sz.iter().position(|&c| c == 0).unwrap_or(sz.len());
    String::from_utf16_lossy(&sz[..len])
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Low-level mouse hook callback.
///
/// # Safety
///
/// Called by Windows on the dispatcher thread; must return quickly or the OS
/// silently drops the hook. Only WM_MOUSEMOVE is examined, every other event
/// is forwarded untouched.
unsafe extern "system" fn mouse_hook_proc(n_code: i32, w_param: WPARAM, l_param: LPARAM) -> LRESULT {
    if n_code == HC_ACTION as i32 && w_param.0 as u32 == WM_MOUSEMOVE {
        // SAFETY: l_param points to an MSLLHOOKSTRUCT for HC_ACTION.
        let ms = &*(l_param.0 as *const MSLLHOOKSTRUCT);
        let injected = (ms.flags & LLMHF_INJECTED) != 0;
        let pt = Point::new(ms.pt.x, ms.pt.y);

        let raw = RUNTIME.with(Cell::get);
        if !raw.is_null() && !IN_CALLBACK.with(Cell::get) {
            IN_CALLBACK.with(|c| c.set(true));
            // SAFETY: the runtime is owned by run() on this thread and stays
            // alive until the hook is unregistered; IN_CALLBACK ensures no
            // second mutable borrow when SetCursorPos re-enters this proc
            // before the frame unwinds.
            let runtime = &mut *raw;
            let disposition = runtime
                .pipeline
                .on_mouse_move(&mut runtime.desktop, pt, injected);
            IN_CALLBACK.with(|c| c.set(false));

            if disposition == Disposition::Suppress {
                return LRESULT(1);
            }
        }
    }
    CallNextHookEx(None, n_code, w_param, l_param)
}

/// Runs a topology refresh from the window procedure, through the same
/// runtime pointer the hook uses. Refreshes never overlap a hook callback:
/// both arrive through the same message loop.
fn refresh_from_dispatcher() {
    let raw = RUNTIME.with(Cell::get);
    if raw.is_null() || IN_CALLBACK.with(Cell::get) {
        return;
    }
    IN_CALLBACK.with(|c| c.set(true));
    // SAFETY: same ownership argument as in mouse_hook_proc.
    let runtime = unsafe { &mut *raw };
    runtime.pipeline.refresh_topology(&runtime.desktop);
    IN_CALLBACK.with(|c| c.set(false));
}

/// Window procedure of the hidden carrier window.
///
/// # Safety
///
/// Standard wndproc contract; dispatched on the message-loop thread.
unsafe extern "system" fn hidden_wndproc(
    hwnd: HWND,
    msg: u32,
    w_param: WPARAM,
    l_param: LPARAM,
) -> LRESULT {
    match msg {
        // Display-change delivery is not reliable on every configuration
        // (docking hot-plug, remote desktop), hence the timer below as well.
        WM_DISPLAYCHANGE | WM_SETTINGCHANGE => {
            refresh_from_dispatcher();
            LRESULT(0)
        }
        WM_TIMER if w_param.0 == TOPOLOGY_TIMER_ID => {
            refresh_from_dispatcher();
            LRESULT(0)
        }
        WM_CLOSE => {
            PostQuitMessage(0);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, w_param, l_param),
    }
}

/// Console interrupt handler; runs on a Windows-owned thread and must not
/// touch core state. Posting WM_QUIT makes the dispatcher unwind cleanly.
///
/// # Safety
///
/// Registered through SetConsoleCtrlHandler; only reads an atomic.
unsafe extern "system" fn console_ctrl_handler(_ctrl_type: u32) -> windows::Win32::Foundation::BOOL {
    let tid = DISPATCHER_THREAD_ID.load(Ordering::Relaxed);
    if tid != 0 {
        let _ = PostThreadMessageW(tid, WM_QUIT, WPARAM(0), LPARAM(0));
    }
    TRUE
}

/// Runs the dispatcher until WM_QUIT.
///
/// Acquires the hidden window, the topology timer and the global mouse hook,
/// pumps messages, and releases everything in reverse order. The hook is
/// unregistered before the runtime pointer is cleared, so no callback can
/// observe a dangling runtime.
pub fn run(pipeline: CrossingPipeline) -> PlatformResult<()> {
    set_dpi_awareness();

    DISPATCHER_THREAD_ID.store(unsafe { GetCurrentThreadId() }, Ordering::Relaxed);
    // SAFETY: handler registration; failure only costs Ctrl+C cleanliness.
    unsafe {
        let _ = SetConsoleCtrlHandler(Some(console_ctrl_handler), TRUE);
    }

    let mut runtime = Box::new(HookRuntime {
        pipeline,
        desktop: WinDesktop,
    });
    runtime.pipeline.refresh_topology(&runtime.desktop);
    if runtime.pipeline.monitor_count() == 0 {
        return Err(PlatformError::NoMonitors);
    }

    // Hidden top-level window; exists only to receive WM_DISPLAYCHANGE,
    // WM_SETTINGCHANGE and the topology timer.
    let class_name = wide(HIDDEN_CLASS_NAME);
    // SAFETY: standard window-class registration and creation; the class
    // name buffer outlives both calls.
    let hwnd = unsafe {
        let hinstance: HINSTANCE = GetModuleHandleW(None)
            .map_err(|e| PlatformError::WindowClass(e.to_string()))?
            .into();

        let wc = WNDCLASSW {
            hInstance: hinstance,
            lpszClassName: PCWSTR(class_name.as_ptr()),
            lpfnWndProc: Some(hidden_wndproc),
            ..Default::default()
        };
        if RegisterClassW(&wc) == 0 {
            return Err(PlatformError::WindowClass(
                windows::core::Error::from_win32().to_string(),
            ));
        }

        CreateWindowExW(
            WINDOW_EX_STYLE::default(),
            PCWSTR(class_name.as_ptr()),
            PCWSTR::null(),
            WS_POPUP,
            0,
            0,
            0,
            0,
            None,
            None,
            hinstance,
            None,
        )
        .map_err(|e| PlatformError::WindowCreate(e.to_string()))?
    };

    // SAFETY: hwnd is valid until DestroyWindow below.
    if unsafe { SetTimer(hwnd, TOPOLOGY_TIMER_ID, TOPOLOGY_INTERVAL_MS, None) } == 0 {
        let err = windows::core::Error::from_win32().to_string();
        unsafe {
            let _ = DestroyWindow(hwnd);
        }
        return Err(PlatformError::TimerCreate(err));
    }

    tracing::info!(
        monitors = runtime.pipeline.monitor_count(),
        "installing mouse hook"
    );

    // The runtime stays untouched from here on; callbacks own it through
    // this pointer until the hook is removed.
    RUNTIME.with(|c| c.set(&mut *runtime as *mut HookRuntime));

    // SAFETY: the callback and this thread's message loop satisfy the
    // WH_MOUSE_LL contract; the runtime pointer is already published.
    let hook = match unsafe { SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook_proc), None, 0) } {
        Ok(hook) => hook,
        Err(e) => {
            RUNTIME.with(|c| c.set(ptr::null_mut()));
            unsafe {
                let _ = KillTimer(hwnd, TOPOLOGY_TIMER_ID);
                let _ = DestroyWindow(hwnd);
            }
            return Err(PlatformError::HookInstall(e.to_string()));
        }
    };

    // Message loop; WH_MOUSE_LL callbacks are dispatched from inside
    // GetMessageW, strictly serialized with the timer and display messages.
    let mut msg = MSG::default();
    // SAFETY: standard GetMessage/DispatchMessage pump.
    unsafe {
        loop {
            let ret = GetMessageW(&mut msg, None, 0, 0);
            if ret.0 == -1 {
                tracing::error!(
                    "message loop error: {}",
                    windows::core::Error::from_win32()
                );
                break;
            }
            if ret.0 == 0 {
                break;
            }
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }

    // Teardown order matters: no callback may run once the runtime pointer
    // is gone, so the hook goes first.
    unsafe {
        let _ = UnhookWindowsHookEx(hook);
    }
    RUNTIME.with(|c| c.set(ptr::null_mut()));
    unsafe {
        let _ = KillTimer(hwnd, TOPOLOGY_TIMER_ID);
        let _ = DestroyWindow(hwnd);
    }

    tracing::info!("dispatcher stopped");
    Ok(())
}
