use crate::config::{self, Config};
use crate::events::AppEvent;
use crate::gui::host::{self, GtkHost};
use crate::gui::menu;
use crate::gui::theme::{self, ThemeColors};
use crate::gui::window;
use gtk::prelude::*;
use gtk4 as gtk;
use piemenu_core::{PieMenu, Point};
use relm4::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

pub struct AppModel {
    pub menu: Rc<RefCell<PieMenu<GtkHost>>>,
    pub visible: bool,
    /// Show was requested before the pointer position was known.
    pub pending_show: bool,
    pub root: gtk::ApplicationWindow,
    pub drawing_area: gtk::DrawingArea,
}

#[derive(Debug)]
pub enum AppMsg {
    Show,
    Hide,
    Press(Point),
    Release(Point),
    CursorMove(Point),
    Cancel,
    /// A timer tick, tagged with the ticket it was armed with.
    Timer(u64),
    ConfigReload,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::Show => AppMsg::Show,
            AppEvent::Hide => AppMsg::Hide,
            AppEvent::ConfigReload => AppMsg::ConfigReload,
        }
    }
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = (Config, async_channel::Receiver<AppEvent>);
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        #[name = "window"]
        gtk::ApplicationWindow {
            set_title: Some("Piemenu"),
            #[watch]
            set_visible: model.visible,
            #[watch]
            set_opacity: if model.visible { 1.0 } else { 0.0 },
            add_css_class: "piemenu-window",
            set_decorated: false,

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[sender] => move |_, key, _, _| {
                    if key == gtk::gdk::Key::Escape {
                        sender.input(AppMsg::Cancel);
                        return glib::Propagation::Stop;
                    }
                    glib::Propagation::Proceed
                }
            },

            #[name = "drawing_area"]
            gtk::DrawingArea {
                set_hexpand: true,
                set_vexpand: true,
                add_css_class: "piemenu-drawing-area",

                add_controller = gtk::EventControllerMotion {
                    connect_motion[sender] => move |_, x, y| {
                        sender.input(AppMsg::CursorMove(Point::new(x, y)));
                    }
                },

                add_controller = gtk::GestureClick {
                    set_button: 0, // Listen to all buttons
                    connect_pressed[sender] => move |_, _, x, y| {
                        sender.input(AppMsg::Press(Point::new(x, y)));
                    },
                    connect_released[sender] => move |_, _, x, y| {
                        sender.input(AppMsg::Release(Point::new(x, y)));
                    }
                }
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let (config, rx) = init;

        theme::load_css();
        window::init_layer_shell(&root);

        let mut menu = PieMenu::new(GtkHost::new(root.clone(), sender.input_sender().clone()));
        host::install(&mut menu, &config);

        let model = AppModel {
            menu: Rc::new(RefCell::new(menu)),
            visible: false,
            pending_show: false,
            root: root.clone(),
            drawing_area: gtk::DrawingArea::default(),
        };

        let widgets = view_output!();

        let mut model = model;
        model.drawing_area = widgets.drawing_area.clone();

        let menu_draw = model.menu.clone();
        widgets
            .drawing_area
            .set_draw_func(move |drawing_area, cr, _, _| {
                let style_context = drawing_area.style_context();
                let colors = ThemeColors::from_context(&style_context);
                if let Err(e) = menu::draw(cr, menu_draw.borrow().host(), &colors) {
                    log::error!("Drawing error: {}", e);
                }
            });

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        root.set_visible(false);

        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, _sender: ComponentSender<Self>) {
        match msg {
            AppMsg::Show => {
                self.visible = true;
                match window::pointer_position(&self.root) {
                    Some(point) => self.open_at(point, false),
                    None => {
                        log::debug!("Cursor position unknown, opening on first pointer event");
                        self.pending_show = true;
                    }
                }
            }
            AppMsg::Hide => {
                self.pending_show = false;
                self.menu.borrow_mut().cancel();
            }
            AppMsg::Press(point) => {
                if self.pending_show {
                    self.open_at(point, true);
                } else if self.menu.borrow().is_tracking() {
                    self.menu.borrow_mut().pointer_down(point);
                }
            }
            AppMsg::Release(point) => {
                if self.menu.borrow().is_tracking() {
                    self.menu.borrow_mut().pointer_up(point);
                }
            }
            AppMsg::CursorMove(point) => {
                if self.pending_show {
                    self.open_at(point, false);
                } else {
                    self.menu.borrow_mut().pointer_move(point);
                }
            }
            AppMsg::Cancel => {
                self.pending_show = false;
                self.menu.borrow_mut().cancel();
            }
            AppMsg::Timer(ticket) => {
                let mut menu = self.menu.borrow_mut();
                if menu.host_mut().timer_fired(ticket) {
                    menu.on_timer();
                }
            }
            AppMsg::ConfigReload => match config::load_config() {
                Ok(new_config) => {
                    let mut menu = self.menu.borrow_mut();
                    menu.cancel();
                    host::install(&mut menu, &new_config);
                    log::info!("Configuration reloaded");
                }
                Err(e) => log::error!("Failed to reload config: {}", e),
            },
        }
        self.sync();
    }
}

impl AppModel {
    /// Opens the default pie at `point`. Without a held button the pie is pinned right away.
    fn open_at(&mut self, point: Point, pressed: bool) {
        self.pending_show = false;
        let mut menu = self.menu.borrow_mut();
        if let Err(e) = menu.start_pie(point, None, false) {
            log::error!("Failed to open pie menu: {}", e);
            return;
        }
        if !pressed {
            menu.pointer_up(point);
        }
    }

    fn sync(&mut self) {
        self.visible = self.pending_show || self.menu.borrow().is_tracking();
        self.drawing_area.queue_draw();
    }
}
