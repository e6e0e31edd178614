use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ar,
    He,
    En,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

/// Static labels of the captioning controls.
#[derive(Debug)]
pub struct Labels {
    pub title: &'static str,
    pub upload: &'static str,
    pub make_captions: &'static str,
    pub download: &'static str,
    pub output: &'static str,
    pub ready: &'static str,
}

/// Status line texts. The `*_failed` ones are prefixes for the error message.
#[derive(Debug)]
pub struct Messages {
    pub pick_video: &'static str,
    pub uploading: &'static str,
    pub uploaded: &'static str,
    pub upload_failed: &'static str,
    pub transcribing: &'static str,
    pub captions_ready: &'static str,
    pub captions_failed: &'static str,
}

static AR_LABELS: Labels = Labels {
    title: "CC داخل الفيديو",
    upload: "رفع",
    make_captions: "عمل CC",
    download: "تحميل الفيديو مع الترجمة",
    output: "المخرجات",
    ready: "جاهز",
};

static HE_LABELS: Labels = Labels {
    title: "כתוביות בתוך הווידאו",
    upload: "העלה",
    make_captions: "צור כתוביות",
    download: "הורדת וידאו עם כתוביות",
    output: "פלט",
    ready: "מוכן",
};

static EN_LABELS: Labels = Labels {
    title: "Video Captions",
    upload: "Upload",
    make_captions: "Generate CC",
    download: "Download Video with Subtitles",
    output: "Output",
    ready: "Ready",
};

static AR_MESSAGES: Messages = Messages {
    pick_video: "اختار فيديو أولاً",
    uploading: "برفع الفيديو...",
    uploaded: "تم رفع الفيديو ✅",
    upload_failed: "فشل الرفع: ",
    transcribing: "بعمل CC...",
    captions_ready: "CC جاهز ✅",
    captions_failed: "فشل CC: ",
};

static HE_MESSAGES: Messages = Messages {
    pick_video: "בחר וידאו קודם",
    uploading: "מעלה את הווידאו...",
    uploaded: "הווידאו הועלה ✅",
    upload_failed: "ההעלאה נכשלה: ",
    transcribing: "יוצר כתוביות...",
    captions_ready: "הכתוביות מוכנות ✅",
    captions_failed: "יצירת הכתוביות נכשלה: ",
};

static EN_MESSAGES: Messages = Messages {
    pick_video: "Pick a video first",
    uploading: "Uploading video...",
    uploaded: "Video uploaded ✅",
    upload_failed: "Upload failed: ",
    transcribing: "Generating captions...",
    captions_ready: "Captions ready ✅",
    captions_failed: "Captions failed: ",
};

impl Language {
    /// Unknown codes fall back to the default language.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "he" => Language::He,
            "en" => Language::En,
            "ar" => Language::Ar,
            _ => Language::default(),
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::Ar => "ar",
            Language::He => "he",
            Language::En => "en",
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            Language::Ar | Language::He => Direction::Rtl,
            Language::En => Direction::Ltr,
        }
    }

    pub fn labels(self) -> &'static Labels {
        match self {
            Language::Ar => &AR_LABELS,
            Language::He => &HE_LABELS,
            Language::En => &EN_LABELS,
        }
    }

    pub fn messages(self) -> &'static Messages {
        match self {
            Language::Ar => &AR_MESSAGES,
            Language::He => &HE_MESSAGES,
            Language::En => &EN_MESSAGES,
        }
    }
}
