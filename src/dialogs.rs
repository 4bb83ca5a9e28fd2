use crate::batch::IMAGE_EXTENSIONS;
use crate::border::CropConfirm;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use std::path::{Path, PathBuf};

pub fn show_error(title: &str, message: &str) {
    MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title(title)
        .set_description(message)
        .set_buttons(MessageButtons::Ok)
        .show();
}

pub fn show_warning(title: &str, message: &str) {
    MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title(title)
        .set_description(message)
        .set_buttons(MessageButtons::Ok)
        .show();
}

pub fn show_info(title: &str, message: &str) {
    MessageDialog::new()
        .set_level(MessageLevel::Info)
        .set_title(title)
        .set_description(message)
        .set_buttons(MessageButtons::Ok)
        .show();
}

pub fn pick_input_images() -> Option<Vec<PathBuf>> {
    FileDialog::new()
        .set_title("Select Input Images")
        .add_filter("Image files", &IMAGE_EXTENSIONS)
        .pick_files()
        .filter(|files| !files.is_empty())
}

pub fn pick_output_directory() -> Option<PathBuf> {
    FileDialog::new()
        .set_title("Select Output Directory")
        .pick_folder()
}

/// Yes/No dialog shown before an image gets cropped.
pub struct DialogCropConfirm;

impl CropConfirm for DialogCropConfirm {
    fn confirm_crop(&mut self, image: &Path) -> bool {
        let name = image.with_extension("");
        let answer = MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title("Proceed?")
            .set_description(format!(
                "The current configuration will crop the image {}. Do you want to proceed?",
                name.display()
            ))
            .set_buttons(MessageButtons::YesNo)
            .show();

        matches!(answer, MessageDialogResult::Yes)
    }
}
