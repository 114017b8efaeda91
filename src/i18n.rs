//! English/Indonesian message dictionary for client-facing text.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    Id,
}

impl Lang {
    /// Picks the first supported language tag from an `Accept-Language` header.
    pub fn from_accept_language(header: &str) -> Self {
        header
            .split(',')
            .filter_map(|part| part.split(';').next())
            .map(|tag| tag.trim().to_ascii_lowercase())
            .find_map(|tag| {
                let primary = tag.split('-').next().unwrap_or_default().to_string();
                match primary.as_str() {
                    "id" | "in" => Some(Lang::Id),
                    "en" => Some(Lang::En),
                    _ => None,
                }
            })
            .unwrap_or_default()
    }
}

const TRANSLATIONS: &[(&str, &str, &str)] = &[
    ("auth.required", "Authentication required", "Autentikasi diperlukan"),
    ("auth.invalid_token", "Invalid or expired session", "Sesi tidak valid atau kedaluwarsa"),
    ("auth.invalid_credentials", "Invalid email or password. Please try again.", "Email atau kata sandi salah. Silakan coba lagi."),
    ("auth.invalid_email", "Please enter a valid email address", "Masukkan alamat email yang valid"),
    ("auth.password_length", "Password must be at least 6 characters", "Kata sandi minimal 6 karakter"),
    ("auth.name_required", "Full name is required", "Nama lengkap wajib diisi"),
    ("auth.email_taken", "Email is already registered", "Email sudah terdaftar"),
    ("auth.not_admin", "Unauthorized: Not an admin", "Tidak diizinkan: Bukan admin"),
    ("auth.user_not_found", "Account not found", "Akun tidak ditemukan"),
    ("product.not_found", "Product not found", "Produk tidak ditemukan"),
    ("product.invalid", "Name, price and category are required", "Nama, harga, dan kategori wajib diisi"),
    ("product.invalid_stock", "Stock cannot be negative", "Stok tidak boleh negatif"),
    ("cart.empty", "Your cart is empty", "Keranjang Anda kosong"),
    ("cart.invalid_quantity", "Quantity must be at least 1", "Jumlah minimal 1"),
    ("cart.item_not_found", "Cart item not found", "Item keranjang tidak ditemukan"),
    ("checkout.address_not_found", "Please select a shipping address", "Pilih alamat pengiriman"),
    ("checkout.insufficient_stock", "Insufficient stock for", "Stok tidak mencukupi untuk"),
    ("checkout.cart_changed", "Your cart changed during checkout. Please review it again.", "Keranjang Anda berubah saat checkout. Silakan periksa kembali."),
    ("checkout.failed", "Failed to place order. Please try again.", "Gagal membuat pesanan. Silakan coba lagi."),
    ("order.not_found", "Order not found", "Pesanan tidak ditemukan"),
    ("order.tracking_required", "Tracking number and courier are required", "Nomor resi dan kurir wajib diisi"),
    ("address.not_found", "Address not found", "Alamat tidak ditemukan"),
    ("address.missing_field", "Required field is missing", "Kolom wajib belum diisi"),
    ("payment.not_found", "Payment not found", "Pembayaran tidak ditemukan"),
    ("payment.invalid_transfer", "Bank name and account number are required", "Nama bank dan nomor rekening wajib diisi"),
    ("payment.invalid_proof", "Payment proof does not match this order", "Bukti pembayaran tidak sesuai dengan pesanan ini"),
    ("image.unsupported_type", "Only JPEG, PNG, and WebP images are allowed", "Hanya gambar JPEG, PNG, dan WebP yang diperbolehkan"),
    ("image.too_large", "File size must be less than 5MB", "Ukuran file harus kurang dari 5MB"),
];

/// Looks up `key` for `lang`, falling back to English and then to the key itself.
pub fn t(lang: Lang, key: &str) -> &str {
    TRANSLATIONS
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, en, id)| match lang {
            Lang::En => *en,
            Lang::Id => *id,
        })
        .unwrap_or(key)
}
