use std::cell::{Cell, RefCell};
use std::rc::Rc;

use hackviewer_wgpu::{wgpu, GpuBackend};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent, Window};

use crate::builder::SceneGraph;
use crate::config::ViewerConfig;
use crate::input::{PointerPos, ViewportRect};
use crate::loader::load_asset;
use crate::session::ViewerSession;

type Session = Rc<RefCell<ViewerSession<GpuBackend>>>;
type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// A registered DOM listener, kept so it can be removed again.
struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn add(target: &EventTarget, kind: &'static str, handler: impl FnMut(Event) + 'static) -> Result<Self, JsValue> {
        let closure = Closure::<dyn FnMut(Event)>::new(handler);
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            kind,
            closure,
        })
    }

    fn remove(self) {
        if let Err(err) = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref())
        {
            log::warn!("Failed to remove {} listener: {err:?}", self.kind);
        }
    }
}

/// Browser-side state of a mounted viewer.
struct Mounted {
    window: Window,
    host: HtmlElement,
    canvas: HtmlCanvasElement,
    session: Session,
    frame_id: Rc<Cell<Option<i32>>>,
    frame_callback: FrameCallback,
    listeners: Vec<Listener>,
}

impl Mounted {
    fn teardown(self) {
        self.session.borrow_mut().stop_loop();
        if let Some(id) = self.frame_id.take() {
            if let Err(err) = self.window.cancel_animation_frame(id) {
                log::warn!("Failed to cancel animation frame: {err:?}");
            }
        }
        // Dropping the callback breaks its self-reference.
        self.frame_callback.borrow_mut().take();

        for listener in self.listeners {
            listener.remove();
        }
        if let Err(err) = self.host.remove_child(&self.canvas) {
            log::warn!("Canvas already detached: {err:?}");
        }
        self.session.borrow_mut().teardown();
    }
}

/// Handle returned to the page. Dropping it unmounts the viewer.
#[wasm_bindgen]
pub struct ViewerHandle {
    session: Session,
    mounted: Option<Mounted>,
}

#[wasm_bindgen]
impl ViewerHandle {
    #[wasm_bindgen(js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        self.session.borrow().is_loading()
    }

    #[wasm_bindgen(js_name = loadProgress)]
    pub fn load_progress(&self) -> f32 {
        self.session.borrow().load_progress()
    }

    /// Stop rendering, remove listeners and the canvas, and free GPU
    /// resources. Later calls do nothing.
    pub fn unmount(&mut self) {
        if let Some(mounted) = self.mounted.take() {
            mounted.teardown();
        }
    }
}

impl Drop for ViewerHandle {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn host_size(host: &HtmlElement) -> (u32, u32) {
    (host.client_width().max(0) as u32, host.client_height().max(0) as u32)
}

fn host_bounds(host: &HtmlElement) -> ViewportRect {
    let rect = host.get_bounding_client_rect();
    ViewportRect::new(rect.left(), rect.top(), rect.right(), rect.bottom())
}

fn pointer(event: &Event) -> Option<PointerPos> {
    event
        .dyn_ref::<MouseEvent>()
        .map(|e| PointerPos::new(e.client_x() as f64, e.client_y() as f64))
}

/// Mount a viewer inside the element with id `host_id`. `on_loaded` is
/// called once, when the model or the fallback has been installed.
pub async fn mount(
    host_id: &str,
    config: ViewerConfig,
    on_loaded: Option<js_sys::Function>,
) -> Result<ViewerHandle, JsValue> {
    let window = web_sys::window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;
    let host = document
        .get_element_by_id(host_id)
        .ok_or_else(|| format!("Host element #{host_id} not found"))?
        .dyn_into::<HtmlElement>()
        .map_err(|_| "Host is not an HTML element")?;

    let (width, height) = host_size(&host);
    let (width, height) = (width.max(1), height.max(1));
    let scene = SceneGraph::new(&config, width, height);

    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| "Failed to create canvas")?;
    canvas.set_width(width);
    canvas.set_height(height);
    host.append_child(&canvas)?;

    let backend = match GpuBackend::new(wgpu::SurfaceTarget::Canvas(canvas.clone()), width, height).await {
        Ok(backend) => backend,
        Err(err) => {
            if let Err(detach) = host.remove_child(&canvas) {
                log::warn!("Canvas already detached: {detach:?}");
            }
            return Err(JsValue::from_str(&format!("Failed to initialize GPU: {err}")));
        }
    };
    let session: Session = Rc::new(RefCell::new(ViewerSession::new(&config, scene, backend, width, height)));

    let mut mounted = Mounted {
        window,
        host,
        canvas,
        session: session.clone(),
        frame_id: Rc::new(Cell::new(None)),
        frame_callback: Rc::new(RefCell::new(None)),
        listeners: Vec::with_capacity(4),
    };
    // A partial mount is unwound with the same teardown as unmount.
    if let Err(err) = attach(&mut mounted) {
        log::error!("Viewer mount failed: {err:?}");
        mounted.teardown();
        return Err(err);
    }

    // Asset load
    session.borrow_mut().begin_load();
    {
        let session = session.clone();
        let texture_url = config.texture_url.clone();
        let model_url = config.model_url.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let progress = session.clone();
            let outcome = load_asset(&texture_url, &model_url, |fraction| {
                progress.borrow_mut().report_progress(fraction)
            })
            .await;
            // The borrow ends before the callback so it may query the handle.
            let applied = session.borrow_mut().finish_load(outcome);
            if let (true, Some(callback)) = (applied, on_loaded) {
                if let Err(err) = callback.call0(&JsValue::NULL) {
                    log::warn!("Load callback threw: {err:?}");
                }
            }
        });
    }

    log::info!("Viewer mounted in #{host_id} at {width}x{height}");
    Ok(ViewerHandle {
        session,
        mounted: Some(mounted),
    })
}

/// Start the frame chain and register the window listeners. Everything
/// attached so far is recorded in `mounted` even when this fails.
fn attach(mounted: &mut Mounted) -> Result<(), JsValue> {
    {
        let session = mounted.session.clone();
        let chain = mounted.frame_callback.clone();
        let id = mounted.frame_id.clone();
        let win = mounted.window.clone();
        *mounted.frame_callback.borrow_mut() = Some(Closure::new(move || {
            id.set(None);
            if !session.borrow_mut().frame() {
                return;
            }
            if let Some(callback) = chain.borrow().as_ref() {
                match win.request_animation_frame(callback.as_ref().unchecked_ref()) {
                    Ok(handle) => id.set(Some(handle)),
                    Err(err) => log::error!("requestAnimationFrame failed: {err:?}"),
                }
            }
        }));
    }
    if let Some(callback) = mounted.frame_callback.borrow().as_ref() {
        let handle = mounted
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())?;
        mounted.frame_id.set(Some(handle));
    }

    let target: EventTarget = mounted.window.clone().into();
    {
        let session = mounted.session.clone();
        let host = mounted.host.clone();
        mounted.listeners.push(Listener::add(&target, "mousedown", move |event| {
            if let Some(pos) = pointer(&event) {
                session.borrow_mut().pointer_down(pos, &host_bounds(&host));
            }
        })?);
    }
    {
        let session = mounted.session.clone();
        mounted.listeners.push(Listener::add(&target, "mousemove", move |event| {
            if let Some(pos) = pointer(&event) {
                session.borrow_mut().pointer_move(pos);
            }
        })?);
    }
    {
        let session = mounted.session.clone();
        mounted.listeners.push(Listener::add(&target, "mouseup", move |_| {
            session.borrow_mut().pointer_up();
        })?);
    }
    {
        let session = mounted.session.clone();
        let host = mounted.host.clone();
        let canvas = mounted.canvas.clone();
        mounted.listeners.push(Listener::add(&target, "resize", move |_| {
            let (width, height) = host_size(&host);
            if width == 0 || height == 0 {
                return;
            }
            if (canvas.width(), canvas.height()) != (width, height) {
                canvas.set_width(width);
                canvas.set_height(height);
            }
            session.borrow_mut().resize(width, height);
        })?);
    }
    Ok(())
}
