//! Capture fixtures shared by the benchmarks.

#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    file: TestFile,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, file: TestFile) -> Self {
        Self { name, group, file }
    }

    pub fn small(name: &'static str, file: TestFile) -> Self {
        Self::new(name, TestGroup::Small, file)
    }

    pub fn large(name: &'static str, file: TestFile) -> Self {
        Self::new(name, TestGroup::Large, file)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn file(&self) -> &TestFile {
        &self.file
    }
}

/// A capture embedded in the benchmark binary.
#[derive(Debug, Copy, Clone)]
pub struct TestFile {
    file_name: &'static str,
    format: CaptureFormat,
    content: &'static str,
}

impl TestFile {
    pub const fn har(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, format: CaptureFormat::Har, content }
    }

    pub const fn raw(file_name: &'static str, content: &'static str) -> Self {
        Self { file_name, format: CaptureFormat::Raw, content }
    }

    pub fn content(&self) -> &'static str {
        self.content
    }

    pub fn format(&self) -> CaptureFormat {
        self.format
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }
}

/// Capture format of a fixture, mirrored here so the fixtures stay free of the library.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureFormat {
    Har,
    Raw,
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Large,
}

impl TestGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestGroup::Small => "small",
            TestGroup::Large => "large",
        }
    }
}

pub static RAW_LOGIN: TestFile = TestFile::raw("login.txt", include_str!("../resources/raw/login.txt"));
pub static RAW_SEARCH: TestFile = TestFile::raw("search.txt", include_str!("../resources/raw/search.txt"));
pub static HAR_SMALL: TestFile = TestFile::har("small.har", include_str!("../resources/har/small.har"));
pub static HAR_LARGE: TestFile = TestFile::har("large.har", include_str!("../resources/har/large.har"));

/// Every fixture, smallest first.
pub fn test_cases() -> Vec<TestCase> {
    vec![
        TestCase::small("raw_login", RAW_LOGIN),
        TestCase::large("raw_search", RAW_SEARCH),
        TestCase::small("har_small", HAR_SMALL),
        TestCase::large("har_large", HAR_LARGE),
    ]
}
