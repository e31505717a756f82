//! Backend endpoint paths, relative to the API base URL.

use urlencoding::encode;

pub const HEALTH: &str = "/health";

pub const AUTH_LOGIN: &str = "/auth/login";
pub const AUTH_LOGOUT: &str = "/auth/logout";
pub const AUTH_ME: &str = "/auth/me";

pub const MASTER_DATA_SATKER: &str = "/master-data/satker";
pub const MASTER_DATA_SATKER_DROPDOWN: &str = "/master-data/satker/dropdown";
pub const MASTER_DATA_JABATAN: &str = "/master-data/jabatan";
pub const MASTER_DATA_JABATAN_DROPDOWN: &str = "/master-data/jabatan/dropdown";
pub const MASTER_DATA_GOLONGAN: &str = "/master-data/golongan";
pub const MASTER_DATA_GOLONGAN_DROPDOWN: &str = "/master-data/golongan/dropdown";
pub const MASTER_DATA_UNIT_KERJA: &str = "/master-data/unit-kerja";
pub const MASTER_DATA_UNIT_KERJA_DROPDOWN: &str = "/master-data/unit-kerja/dropdown";
pub const MASTER_DATA_ESELON: &str = "/master-data/eselon";
pub const MASTER_DATA_ESELON_DROPDOWN: &str = "/master-data/eselon/dropdown";

pub const PEGAWAI: &str = "/kepegawaian/pegawai";
pub const KEPEGAWAIAN_STATISTIK: &str = "/kepegawaian/statistik";
pub const KEPEGAWAIAN_STATISTIK_PANGKAT: &str = "/kepegawaian/statistik/pangkat";
pub const KEPEGAWAIAN_STATISTIK_JABATAN: &str = "/kepegawaian/statistik/jabatan";

pub const RBAC_ROLES: &str = "/rbac/roles";
pub const RBAC_PERMISSIONS: &str = "/rbac/permissions";

pub const AUDIT_LOGS: &str = "/audit-logs";

pub const PDF_GENERATE: &str = "/pdf/generate";
pub const PDF_TEMPLATES: &str = "/pdf/templates";

// Ids are percent-encoded so a stray '/' cannot change the route.

pub fn pegawai_detail(id: &str) -> String { format!("{}/{}", PEGAWAI, encode(id)) }
pub fn pegawai_riwayat_pangkat(id: &str) -> String { format!("{}/riwayat-pangkat", pegawai_detail(id)) }
pub fn pegawai_riwayat_jabatan(id: &str) -> String { format!("{}/riwayat-jabatan", pegawai_detail(id)) }
pub fn pegawai_riwayat_pendidikan(id: &str) -> String { format!("{}/riwayat-pendidikan", pegawai_detail(id)) }
pub fn pegawai_keluarga(id: &str) -> String { format!("{}/keluarga", pegawai_detail(id)) }
pub fn pegawai_foto(id: &str) -> String { format!("{}/upload-foto", pegawai_detail(id)) }
pub fn pegawai_sk(id: &str, tipe: &str) -> String { format!("{}/upload-sk/{}", pegawai_detail(id), encode(tipe)) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameterised_paths() {
        assert_eq!(pegawai_detail("abc-1"), "/kepegawaian/pegawai/abc-1");
        assert_eq!(pegawai_keluarga("abc-1"), "/kepegawaian/pegawai/abc-1/keluarga");
        assert_eq!(pegawai_sk("abc-1", "pangkat"), "/kepegawaian/pegawai/abc-1/upload-sk/pangkat");
        assert_eq!(pegawai_detail("a/b"), "/kepegawaian/pegawai/a%2Fb");
    }
}
