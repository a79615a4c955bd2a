// Widget registry - UI-thread-confined ownership of headless widgets
//
// The registry lives in a thread local that only the headless UI thread
// installs, so widget state is unreachable from any other thread. Callers hold
// `Widget<T>` handles (plain ids, `Send + Sync`) and resolve them inside
// closures run by the `UiExecutor`.
//
// The registry also owns the simulated pointer/keyboard state and routes
// posted input events to the topmost showing widget under the pointer.

use indexmap::IndexMap;
use std::any::Any;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::{PreconditionFailure, Result, RobotError};
use crate::models::{MouseButton, Point};
use crate::ui::bridge::WidgetAccess;
use crate::widgets::Component;

static NEXT_WIDGET_ID: AtomicU64 = AtomicU64::new(1);

const MULTI_CLICK_INTERVAL: Duration = Duration::from_millis(500);

thread_local! {
    static REGISTRY: RefCell<Option<Registry>> = const { RefCell::new(None) };
}

struct Entry {
    any: Rc<dyn Any>,
    component: Rc<RefCell<dyn Component>>,
}

struct Press {
    button: MouseButton,
    origin: Point,
    target: Option<u64>,
}

struct LastClick {
    at: Point,
    button: MouseButton,
    when: Instant,
    count: u32,
}

#[derive(Default)]
struct InputState {
    pointer: Point,
    press: Option<Press>,
    dragging: bool,
    focus: Option<u64>,
    last_click: Option<LastClick>,
}

struct Registry {
    widgets: IndexMap<u64, Entry>,
    input: InputState,
    drag_threshold: i32,
}

/// Simulated native input, posted to the UI thread by [`HeadlessInput`](crate::ui::HeadlessInput)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Moved(Point),
    Pressed(MouseButton),
    Released(MouseButton),
    KeyTyped(char),
}

/// Create the registry for the current thread, which becomes the UI thread
pub(crate) fn install(drag_threshold: i32) {
    REGISTRY.with(|cell| {
        *cell.borrow_mut() = Some(Registry {
            widgets: IndexMap::new(),
            input: InputState::default(),
            drag_threshold,
        });
    });
}

/// Drop every widget owned by the current thread
pub(crate) fn uninstall() {
    let registry = REGISTRY.with(|cell| cell.borrow_mut().take());
    if let Some(registry) = registry {
        tracing::debug!("Releasing {} headless widgets", registry.widgets.len());
    }
}

fn with_registry<R>(f: impl FnOnce(&mut Registry) -> R) -> Result<R> {
    REGISTRY.with(|cell| {
        let mut slot = cell.borrow_mut();
        let registry = slot
            .as_mut()
            .ok_or(RobotError::Precondition(PreconditionFailure::OffDispatchThread))?;
        Ok(f(registry))
    })
}

/// Handle to a widget owned by the headless UI thread
///
/// The handle is a plain id: it can be copied into any closure and across
/// threads, but only resolves on the UI thread.
pub struct Widget<T> {
    id: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Widget<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Widget<T> {}

impl<T> std::fmt::Debug for Widget<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Widget#{}", self.id)
    }
}

impl<T: Component> Widget<T> {
    /// Hand `value` to the registry of the current (UI) thread
    pub fn register(value: T) -> Result<Self> {
        let id = NEXT_WIDGET_ID.fetch_add(1, Ordering::Relaxed);
        let cell = Rc::new(RefCell::new(value));
        let any: Rc<dyn Any> = cell.clone();
        let component: Rc<RefCell<dyn Component>> = cell;
        with_registry(|registry| {
            registry.widgets.insert(id, Entry { any, component });
        })?;
        tracing::debug!("Registered headless widget #{}", id);
        Ok(Self {
            id,
            _marker: PhantomData,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the widget from the screen and drop its state
    pub fn unregister(&self) -> Result<()> {
        with_registry(|registry| registry.widgets.shift_remove(&self.id))?
            .map(|_| ())
            .ok_or(RobotError::WidgetUnavailable(self.id))
    }

    fn resolve(&self) -> Result<Rc<RefCell<T>>> {
        let any = with_registry(|registry| registry.widgets.get(&self.id).map(|e| e.any.clone()))?
            .ok_or(RobotError::WidgetUnavailable(self.id))?;
        any.downcast::<RefCell<T>>()
            .map_err(|_| RobotError::WidgetUnavailable(self.id))
    }
}

impl<T: Component> WidgetAccess for Widget<T> {
    type Target = T;

    fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        let cell = self.resolve()?;
        let mut widget = cell
            .try_borrow_mut()
            .map_err(|_| RobotError::WidgetBusy(self.id))?;
        Ok(f(&mut widget))
    }
}

/// Topmost showing widget whose bounds contain `at`
fn widget_at(registry: &Registry, at: Point) -> Option<(u64, Rc<RefCell<dyn Component>>)> {
    registry.widgets.iter().rev().find_map(|(id, entry)| {
        let component = entry.component.try_borrow().ok()?;
        (component.is_showing() && component.bounds().contains(at))
            .then(|| (*id, entry.component.clone()))
    })
}

enum Delivery {
    Click {
        target: Rc<RefCell<dyn Component>>,
        at: Point,
        button: MouseButton,
        count: u32,
    },
    Drop {
        target: Rc<RefCell<dyn Component>>,
        at: Point,
    },
    Key {
        target: Rc<RefCell<dyn Component>>,
        ch: char,
    },
}

/// Apply one input event to the simulated input state and the widget under it
pub(crate) fn dispatch(event: InputEvent) -> Result<()> {
    let delivery = with_registry(|registry| route(registry, event))?;

    // Widgets are called after the registry borrow is released
    match delivery {
        Some(Delivery::Click {
            target,
            at,
            button,
            count,
        }) => {
            if let Ok(mut widget) = target.try_borrow_mut() {
                if widget.is_enabled() {
                    widget.on_click(at, button, count);
                }
            }
        }
        Some(Delivery::Drop { target, at }) => {
            if let Ok(mut widget) = target.try_borrow_mut() {
                widget.on_drop(at);
            }
        }
        Some(Delivery::Key { target, ch }) => {
            if let Ok(mut widget) = target.try_borrow_mut() {
                widget.on_key(ch);
            }
        }
        None => {}
    }
    Ok(())
}

fn route(registry: &mut Registry, event: InputEvent) -> Option<Delivery> {
    match event {
        InputEvent::Moved(to) => {
            registry.input.pointer = to;
            if let Some(press) = &registry.input.press {
                if !registry.input.dragging
                    && press.origin.distance_to(to) >= registry.drag_threshold
                {
                    registry.input.dragging = true;
                    tracing::debug!("Drag started at {} (now {})", press.origin, to);
                }
            }
            None
        }
        InputEvent::Pressed(button) => {
            let at = registry.input.pointer;
            let target = widget_at(registry, at).map(|(id, _)| id);
            registry.input.press = Some(Press {
                button,
                origin: at,
                target,
            });
            registry.input.dragging = false;
            None
        }
        InputEvent::Released(button) => {
            let press = match registry.input.press.take() {
                Some(press) if press.button == button => press,
                other => {
                    registry.input.press = other;
                    return None;
                }
            };
            let at = registry.input.pointer;
            let was_dragging = std::mem::take(&mut registry.input.dragging);
            let (id, target) = widget_at(registry, at)?;

            if was_dragging {
                return Some(Delivery::Drop { target, at });
            }
            if press.target != Some(id) {
                return None;
            }

            let now = Instant::now();
            let count = match &registry.input.last_click {
                Some(last)
                    if last.at == at
                        && last.button == button
                        && now.duration_since(last.when) <= MULTI_CLICK_INTERVAL =>
                {
                    last.count + 1
                }
                _ => 1,
            };
            registry.input.last_click = Some(LastClick {
                at,
                button,
                when: now,
                count,
            });
            registry.input.focus = Some(id);
            Some(Delivery::Click {
                target,
                at,
                button,
                count,
            })
        }
        InputEvent::KeyTyped(ch) => {
            let focus = registry.input.focus?;
            let target = registry.widgets.get(&focus)?.component.clone();
            Some(Delivery::Key { target, ch })
        }
    }
}

/// Whether a button is held and the pointer has crossed the drag threshold
pub(crate) fn is_dragging() -> Result<bool> {
    with_registry(|registry| registry.input.dragging)
}

pub(crate) fn pointer_location() -> Result<Point> {
    with_registry(|registry| registry.input.pointer)
}
