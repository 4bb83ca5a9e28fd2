use crate::batch;
use crate::config_store::{ConfigError, ConfigStore};
use crate::dialogs::{self, DialogCropConfirm};
use crate::params::{BorderParams, ParamError, ParamFields};
use crate::ui_theme::BorderTheme;
use chrono::Local;
use eframe::egui;
use std::path::Path;

const WIDTH_PLACEHOLDER: &str = "e.g. 1200";
const HEIGHT_PLACEHOLDER: &str = "e.g. 1500";
const BORDER_PLACEHOLDER: &str = "e.g. 50";
const POSTFIX_PLACEHOLDER: &str = "e.g. _border";
const CONFIG_NAME_PLACEHOLDER: &str = "Configuration name";

const MAX_LOGS: usize = 1000;

pub struct BorderApp {
    fields: ParamFields,

    // Configurations
    store: ConfigStore,
    available_configs: Vec<String>,
    selected_config: String,
    /// Name being typed in the save dialog, `None` while it is closed.
    save_prompt: Option<String>,

    logs: Vec<String>,
    theme: BorderTheme,
}

impl BorderApp {
    pub fn new() -> Self {
        Self::with_store(ConfigStore::open_default())
    }

    pub fn with_store(store: ConfigStore) -> Self {
        let mut app = Self {
            fields: ParamFields::default(),
            available_configs: store.list_available(),
            store,
            selected_config: String::new(),
            save_prompt: None,
            logs: Vec::new(),
            theme: BorderTheme::default(),
        };

        app.log(format!("Configurations are stored in {}", app.store.dir().display()));
        app.load_configuration(None);
        app
    }

    fn log(&mut self, message: String) {
        log::info!("{}", message);
        self.logs
            .push(format!("[{}] {}", Local::now().format("%H:%M:%S"), message));

        if self.logs.len() > MAX_LOGS {
            let remove_count = self.logs.len() - MAX_LOGS;
            self.logs.drain(0..remove_count);
        }
    }

    /// Fill the form from a saved record. A missing record changes nothing.
    fn load_configuration(&mut self, name: Option<&str>) {
        let label = name.unwrap_or("last used");
        match self.store.load(name) {
            Ok(Some(record)) => {
                self.fields.apply_record(record);
                self.log(format!("📂 Loaded configuration: {}", label));
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("Failed to load configuration {:?}: {}", label, e);
                self.log(format!("⚠️ Could not load configuration {}: {}", label, e));
            }
        }
    }

    fn save_named(&mut self, name: &str) {
        match self.store.save(&self.fields, Some(name)) {
            Ok(_) => {
                self.available_configs = self.store.list_available();
                self.selected_config = name.trim().to_string();
                self.log(format!("💾 Saved configuration: {}", name.trim()));
            }
            Err(ConfigError::InvalidName(_)) => {
                dialogs::show_warning(
                    "Invalid Name",
                    "Please enter a valid name for the configuration.",
                );
            }
            Err(e) => {
                self.log(format!("❌ Failed to save configuration: {}", e));
                dialogs::show_error("Error", &format!("Failed to save configuration: {}", e));
            }
        }
    }

    /// Validate the form and remember it as the last-used configuration.
    /// Nothing is written when validation fails.
    fn validate_and_remember(&mut self) -> Result<BorderParams, ParamError> {
        let params = self.fields.validate()?;

        if let Err(e) = self.store.save(&self.fields, None) {
            self.log(format!("❌ Failed to save configuration: {}", e));
            dialogs::show_error("Error", &format!("Failed to save configuration: {}", e));
        }
        self.available_configs = self.store.list_available();

        Ok(params)
    }

    fn process_images(&mut self) {
        let params = match self.validate_and_remember() {
            Ok(params) => params,
            Err(e) => {
                self.log(format!("❌ Invalid input: {}", e));
                dialogs::show_error("Invalid Input", &e.to_string());
                return;
            }
        };

        let Some(inputs) = dialogs::pick_input_images() else {
            return;
        };
        let Some(output_dir) = dialogs::pick_output_directory() else {
            return;
        };

        self.log(format!(
            "🖼 Processing {} image(s) into {}",
            inputs.len(),
            output_dir.display()
        ));

        let report = match batch::run_batch(&inputs, &output_dir, &params, &mut DialogCropConfirm) {
            Ok(report) => report,
            Err(e) => {
                self.log(format!("❌ {}", e));
                dialogs::show_error("Error", &e.to_string());
                return;
            }
        };

        for outcome in &report.outcomes {
            self.log(outcome.describe());
        }
        let summary = report.summary();
        self.log(summary.clone());

        dialogs::show_info("Process Complete", &summary);
        self.open_output_dir(&report.output_dir);
    }

    fn open_output_dir(&mut self, dir: &Path) {
        match open::that(dir) {
            Ok(_) => self.log(format!("📁 Opened {}", dir.display())),
            Err(e) => self.log(format!("❌ Failed to open {}: {}", dir.display(), e)),
        }
    }
}

impl eframe::App for BorderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.theme.apply_to_ctx(ctx);

        // Enter submits the form unless the name dialog owns the keyboard
        let submit = self.save_prompt.is_none() && ctx.input(|i| i.key_pressed(egui::Key::Enter));

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(self.theme.padding_medium);
            self.show_parameters(ui);
            self.show_actions(ui);
            self.show_logs_panel(ui);
        });

        self.show_save_prompt(ctx);

        if submit {
            self.process_images();
        }
    }
}

impl BorderApp {
    fn field_row(
        ui: &mut egui::Ui,
        theme: &BorderTheme,
        label: &str,
        value: &mut String,
        hint: &str,
    ) {
        ui.horizontal(|ui| {
            ui.add_sized(
                [theme.label_width, theme.row_height],
                egui::Label::new(
                    egui::RichText::new(label)
                        .size(14.0)
                        .color(theme.text_secondary),
                ),
            );
            ui.add_sized(
                [ui.available_width(), theme.row_height],
                egui::TextEdit::singleline(value)
                    .font(egui::TextStyle::Body)
                    .margin(egui::Vec2::new(8.0, 4.0))
                    .hint_text(hint),
            );
        });
        ui.add_space(theme.spacing_medium);
    }

    fn show_parameters(&mut self, ui: &mut egui::Ui) {
        self.theme.card_frame().show(ui, |ui| {
            ui.vertical(|ui| {
                ui.label(
                    egui::RichText::new("Border and Size")
                        .size(18.0)
                        .strong()
                        .color(self.theme.text_primary),
                );
                ui.add_space(self.theme.spacing_medium);

                Self::field_row(
                    ui,
                    &self.theme,
                    "Width (pixels):",
                    &mut self.fields.width,
                    WIDTH_PLACEHOLDER,
                );
                Self::field_row(
                    ui,
                    &self.theme,
                    "Height (pixels):",
                    &mut self.fields.height,
                    HEIGHT_PLACEHOLDER,
                );
                Self::field_row(
                    ui,
                    &self.theme,
                    "Longest Side Border Size (pixels):",
                    &mut self.fields.border,
                    BORDER_PLACEHOLDER,
                );
                Self::field_row(
                    ui,
                    &self.theme,
                    "Postfix for Edited Photos:",
                    &mut self.fields.postfix,
                    POSTFIX_PLACEHOLDER,
                );
            });
        });
        ui.add_space(self.theme.spacing_medium);
    }

    fn show_actions(&mut self, ui: &mut egui::Ui) {
        let mut process_clicked = false;
        let mut save_clicked = false;
        let mut chosen = None;

        self.theme.card_frame().show(ui, |ui| {
            ui.horizontal(|ui| {
                process_clicked = ui
                    .add_sized([140.0, 32.0], self.theme.primary_button("Process Images"))
                    .clicked();

                ui.add_space(self.theme.spacing_small);

                save_clicked = ui
                    .add_sized([80.0, 32.0], self.theme.secondary_button("Save"))
                    .clicked();

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let selected_text = if self.selected_config.is_empty() {
                        "Select..."
                    } else {
                        self.selected_config.as_str()
                    };

                    egui::ComboBox::from_id_salt("load_config")
                        .width(180.0)
                        .selected_text(selected_text)
                        .show_ui(ui, |ui| {
                            if self.available_configs.is_empty() {
                                ui.label(
                                    egui::RichText::new("No saved configurations")
                                        .color(self.theme.text_muted),
                                );
                            }
                            for name in &self.available_configs {
                                if ui
                                    .selectable_label(self.selected_config == *name, name.as_str())
                                    .clicked()
                                {
                                    chosen = Some(name.clone());
                                }
                            }
                        });

                    ui.label(
                        egui::RichText::new("Load Configuration:")
                            .size(14.0)
                            .color(self.theme.text_secondary),
                    );
                });
            });
        });
        ui.add_space(self.theme.spacing_medium);

        if let Some(name) = chosen {
            self.load_configuration(Some(&name));
            self.selected_config = name;
        }
        if save_clicked {
            self.save_prompt = Some(self.selected_config.clone());
        }
        if process_clicked {
            self.process_images();
        }
    }

    fn show_save_prompt(&mut self, ctx: &egui::Context) {
        let Some(name) = self.save_prompt.as_mut() else {
            return;
        };

        let mut submit = false;
        let mut cancel = false;

        egui::Window::new("Save Configuration")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Enter configuration name:");
                let response = ui.add(
                    egui::TextEdit::singleline(name)
                        .hint_text(CONFIG_NAME_PLACEHOLDER)
                        .desired_width(220.0),
                );
                response.request_focus();

                if ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submit = true;
                }
                if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                    cancel = true;
                }

                ui.add_space(self.theme.spacing_medium);
                ui.horizontal(|ui| {
                    if ui.add(self.theme.primary_button("Save")).clicked() {
                        submit = true;
                    }
                    if ui.add(self.theme.secondary_button("Cancel")).clicked() {
                        cancel = true;
                    }
                });
            });

        if submit {
            let name = self.save_prompt.take().unwrap_or_default();
            self.save_named(&name);
        } else if cancel {
            self.save_prompt = None;
        }
    }

    fn show_logs_panel(&mut self, ui: &mut egui::Ui) {
        self.theme.card_frame().show(ui, |ui| {
            ui.set_min_height(ui.available_height());
            ui.label(
                egui::RichText::new("Logs")
                    .size(18.0)
                    .strong()
                    .color(self.theme.text_primary),
            );
            ui.add_space(self.theme.spacing_small);

            egui::ScrollArea::vertical()
                .id_salt("logs_scroll")
                .stick_to_bottom(true)
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    if self.logs.is_empty() {
                        ui.label(
                            egui::RichText::new("No logs yet")
                                .size(14.0)
                                .color(self.theme.text_muted),
                        );
                    }
                    for line in &self.logs {
                        ui.label(
                            egui::RichText::new(line)
                                .size(12.0)
                                .color(self.theme.text_secondary),
                        );
                    }
                });
        });
    }
}
