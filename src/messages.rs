//! User-facing text. The clinic runs in Turkish.

pub const LOGIN_FAILED: &str = "Giriş başarısız!";
pub const REGISTER_FAILED: &str = "Kayıt başarısız!";
pub const DOCTOR_REGISTERED: &str = "Kayıt başarılı! Giriş ekranına yönlendiriliyorsunuz...";
pub const PROFILE_UPDATED: &str = "Profil güncellendi!";
pub const PROFILE_UPDATE_FAILED: &str = "Güncelleme başarısız!";
pub const APPOINTMENT_CREATED: &str = "Randevu başarıyla eklendi!";
pub const APPOINTMENT_FAILED: &str = "Randevu eklenemedi!";
pub const STATUS_UPDATE_FAILED: &str = "Randevu durumu güncellenemedi!";
pub const MR_UPLOADED: &str = "MR görüntüsü yüklendi!";
pub const MR_UPLOAD_FAILED: &str = "Yükleme başarısız!";
pub const DELETE_FAILED: &str = "Silme işlemi başarısız!";
pub const LOAD_FAILED: &str = "Veriler yüklenemedi.";
pub const PREDICTION_FAILED: &str = "Tahmin alınırken hata oluştu.";
pub const NO_PREDICTION_YET: &str = "Henüz tahmin yapılmadı.";

/// Local validation failures, caught before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("Email ve şifre gerekli.")]
    MissingCredentials,
    #[error("Tüm alanları doldurun ve sözleşmeyi kabul edin.")]
    IncompletePatientRegistration,
    #[error("Tüm alanları doldurun.")]
    MissingFields,
    #[error("Şifreler eşleşmiyor.")]
    PasswordMismatch,
    #[error("Lütfen önce bir hasta seçin.")]
    NoPatientSelected,
    #[error("Dosya seçin.")]
    NoFileSelected,
    #[error("Geçersiz tarih. YYYY-AA-GG biçimini kullanın.")]
    InvalidDate,
}
