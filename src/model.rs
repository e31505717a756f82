//! Records returned by the SIKERMA backend.
//!
//! Field names follow the backend's JSON. Identifiers stay plain strings here so a single
//! malformed legacy row cannot fail a whole list; use [`Pegawai::nip_info`] or the
//! [`crate::ident`] newtypes when a validated value is needed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ident::{self, Gender, NipInfo};

/// Employment category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusPegawai {
    Pns,
    Cpns,
    Pppk,
    Honorer,
}

impl StatusPegawai {
    pub fn is_pns(self) -> bool { matches!(self, StatusPegawai::Pns | StatusPegawai::Cpns) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKerja {
    Aktif,
    Cuti,
    Pensiun,
    /// Older records carry a bare `mutasi`.
    #[serde(alias = "mutasi")]
    MutasiKeluar,
    MutasiMasuk,
    Meninggal,
    Pemberhentian,
}

impl StatusKerja {
    pub fn is_active(self) -> bool { matches!(self, StatusKerja::Aktif | StatusKerja::Cuti | StatusKerja::MutasiMasuk) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JenisJabatan {
    Struktural,
    FungsionalTertentu,
    FungsionalUmum,
    Pelaksana,
}

/// Family relation. The backend capitalises these; the portal sends lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKeluarga {
    #[serde(alias = "suami")]
    Suami,
    #[serde(alias = "istri")]
    Istri,
    #[serde(alias = "anak")]
    Anak,
    #[serde(alias = "ayah")]
    Ayah,
    #[serde(alias = "ibu")]
    Ibu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JenisKenaikanPangkat {
    Reguler,
    Pilihan,
    PenyesuaianIjazah,
    Lainnya,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Satker {
    pub id: Uuid,
    pub kode: String,
    pub nama: String,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    pub level: i32,
    #[serde(default)]
    pub alamat: Option<String>,
    #[serde(default)]
    pub telepon: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Eselon {
    pub id: Uuid,
    pub kode: String,
    pub nama: String,
    #[serde(default)]
    pub level: Option<i32>,
    #[serde(default)]
    pub tunjangan: Option<f64>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jabatan {
    pub id: Uuid,
    pub kode: String,
    pub nama: String,
    #[serde(default)]
    pub eselon_id: Option<Uuid>,
    #[serde(default)]
    pub kelas: Option<String>,
    #[serde(default)]
    pub jenis: Option<JenisJabatan>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eselon: Option<Eselon>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Golongan {
    pub id: Uuid,
    pub kode: String,
    pub nama: String,
    pub ruang: String,
    pub angka: i32,
    pub is_active: bool,
}

impl Golongan {
    /// `III/a` style label.
    pub fn label(&self) -> String { format!("{}/{}", self.kode, self.ruang) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitKerja {
    pub id: Uuid,
    pub kode: String,
    pub nama: String,
    #[serde(default)]
    pub singkatan: Option<String>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub satker_id: Option<Uuid>,
    pub is_active: bool,
}

/// Reference row shared by the small lookup tables (agama, status kawin, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefItem {
    pub id: Uuid,
    pub kode: String,
    pub nama: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pegawai {
    pub id: Uuid,
    pub nip: String,
    #[serde(alias = "nama")]
    pub nama_lengkap: String,
    #[serde(default)]
    pub gelar_depan: Option<String>,
    #[serde(default)]
    pub gelar_belakang: Option<String>,
    pub tempat_lahir: String,
    pub tanggal_lahir: DateTime<Utc>,
    pub jenis_kelamin: Gender,
    #[serde(default)]
    pub nik: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telepon: Option<String>,
    #[serde(default)]
    pub alamat: Option<String>,
    #[serde(default)]
    pub foto: Option<String>,
    pub satker_id: Uuid,
    #[serde(default)]
    pub jabatan_id: Option<Uuid>,
    #[serde(default)]
    pub unit_kerja_id: Option<Uuid>,
    #[serde(default)]
    pub golongan_id: Option<Uuid>,
    pub status_pegawai: StatusPegawai,
    pub status_kerja: StatusKerja,
    #[serde(default)]
    pub tmt_cpns: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tmt_jabatan: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satker: Option<Satker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jabatan: Option<Jabatan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_kerja: Option<UnitKerja>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub golongan: Option<Golongan>,
}

impl Pegawai {
    /// Name with academic titles: `Dr. Siti Aminah, S.H., M.H.`.
    pub fn nama_gelar(&self) -> String {
        let mut out = String::new();
        if let Some(d) = self.gelar_depan.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            out.push_str(d);
            out.push(' ');
        }
        out.push_str(self.nama_lengkap.trim());
        if let Some(b) = self.gelar_belakang.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            out.push_str(", ");
            out.push_str(b);
        }
        out
    }

    pub fn nip_info(&self) -> Option<NipInfo> { ident::parse_nip(&ident::compact(&self.nip)) }

    pub fn nip_formatted(&self) -> String { ident::format_nip(&self.nip) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiwayatPangkat {
    pub id: Uuid,
    pub pegawai_id: Uuid,
    pub golongan_id: Uuid,
    pub pangkat: String,
    pub tmt: DateTime<Utc>,
    pub nomor_sk: String,
    pub tanggal_sk: DateTime<Utc>,
    pub pejabat: String,
    #[serde(default)]
    pub file_sk: Option<String>,
    pub gaji_pokok: f64,
    pub is_terakhir: bool,
    #[serde(default)]
    pub jenis_kenaikan: Option<JenisKenaikanPangkat>,
    #[serde(default)]
    pub masa_kerja_tahun: i32,
    #[serde(default)]
    pub masa_kerja_bulan: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub golongan: Option<Golongan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiwayatJabatan {
    pub id: Uuid,
    pub pegawai_id: Uuid,
    #[serde(default)]
    pub jabatan_id: Option<Uuid>,
    #[serde(default)]
    pub unit_kerja_id: Option<Uuid>,
    #[serde(default)]
    pub satker_id: Option<Uuid>,
    pub nama_jabatan: String,
    pub tmt: DateTime<Utc>,
    pub nomor_sk: String,
    pub tanggal_sk: DateTime<Utc>,
    pub pejabat: String,
    #[serde(default)]
    pub file_sk: Option<String>,
    pub is_terakhir: bool,
    #[serde(default)]
    pub jenis_jabatan: Option<JenisJabatan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiwayatPendidikan {
    pub id: Uuid,
    pub pegawai_id: Uuid,
    pub pendidikan_id: Uuid,
    pub nama_institusi: String,
    #[serde(default)]
    pub jurusan: Option<String>,
    pub tahun_masuk: i32,
    pub tahun_lulus: i32,
    #[serde(default)]
    pub nomor_ijazah: Option<String>,
    #[serde(default)]
    pub tanggal_ijazah: Option<DateTime<Utc>>,
    #[serde(default)]
    pub file_ijazah: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keluarga {
    pub id: Uuid,
    pub pegawai_id: Uuid,
    #[serde(alias = "status_keluarga")]
    pub hubungan: StatusKeluarga,
    pub nama: String,
    #[serde(default)]
    pub tempat_lahir: Option<String>,
    #[serde(default)]
    pub tanggal_lahir: Option<DateTime<Utc>>,
    #[serde(default)]
    pub jenis_kelamin: Option<Gender>,
    #[serde(default)]
    pub nik: Option<String>,
    #[serde(default)]
    pub pendidikan: Option<String>,
    #[serde(default)]
    pub pekerjaan: Option<String>,
    pub is_tanggungan: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: Uuid,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    pub action: String,
    pub resource: String,
    #[serde(default)]
    pub resource_id: Option<Uuid>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub changes: Option<serde_json::Value>,
    pub status: String,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// `{value, label}` pair served by the `/dropdown` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption<T = String> {
    pub value: T,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatistikKepegawaian {
    pub total_pegawai: u64,
    #[serde(default)]
    pub per_status: BTreeMap<String, u64>,
    pub pns: u64,
    pub non_pns: u64,
    #[serde(default)]
    pub per_golongan: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatistikPerGolongan {
    pub golongan: String,
    pub total: u64,
    pub pns: u64,
    pub non_pns: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatistikPerJabatan {
    pub jabatan: String,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pegawai_json() -> serde_json::Value {
        json!({
            "id": "7f0c4c3e-3b7a-4b8e-9d1a-2b1c0f5e8a10",
            "nip": "198501012010011001",
            "nama_lengkap": "Siti Aminah",
            "gelar_depan": "Dr.",
            "gelar_belakang": "S.H., M.H.",
            "tempat_lahir": "Bandung",
            "tanggal_lahir": "1985-01-01T00:00:00+07:00",
            "jenis_kelamin": "P",
            "satker_id": "0c9a3c8e-1111-4e6b-8f3e-6e2b7d1a9c55",
            "status_pegawai": "PNS",
            "status_kerja": "aktif",
            "is_active": true,
            "created_at": "2024-03-01T08:00:00Z",
            "updated_at": "2024-03-01T08:00:00Z"
        })
    }

    #[test]
    fn decodes_pegawai() {
        let p: Pegawai = serde_json::from_value(pegawai_json()).unwrap();
        assert_eq!(p.nama_gelar(), "Dr. Siti Aminah, S.H., M.H.");
        assert_eq!(p.nip_formatted(), "19850101 201001 1 001");
        assert_eq!(p.nip_info().map(|i| i.tahun_lahir), Some(1985));
        assert!(p.status_pegawai.is_pns());
        assert!(p.status_kerja.is_active());
        assert_eq!(p.jenis_kelamin, Gender::P);
        assert!(p.satker.is_none());
    }

    #[test]
    fn accepts_portal_spellings() {
        let mut v = pegawai_json();
        v["status_kerja"] = json!("mutasi");
        v["nip"] = json!("19850101 201001 1 001");
        let p: Pegawai = serde_json::from_value(v).unwrap();
        assert_eq!(p.status_kerja, StatusKerja::MutasiKeluar);
        assert!(p.nip_info().is_some());

        let k: Keluarga = serde_json::from_value(json!({
            "id": "7f0c4c3e-3b7a-4b8e-9d1a-2b1c0f5e8a11",
            "pegawai_id": "7f0c4c3e-3b7a-4b8e-9d1a-2b1c0f5e8a10",
            "status_keluarga": "istri",
            "nama": "Rina",
            "is_tanggungan": true
        }))
        .unwrap();
        assert_eq!(k.hubungan, StatusKeluarga::Istri);
        assert_eq!(serde_json::to_value(k.hubungan).unwrap(), json!("Istri"));
    }

    #[test]
    fn statistik_defaults_missing_maps() {
        let s: StatistikKepegawaian = serde_json::from_value(json!({"total_pegawai": 12, "pns": 10, "non_pns": 2})).unwrap();
        assert_eq!(s.total_pegawai, s.pns + s.non_pns);
        assert!(s.per_golongan.is_empty());
    }
}
