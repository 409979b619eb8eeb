//! 提交构建服务 - 业务能力层
//!
//! 把选中的简历和职位描述转换为可发送的 multipart 负载。
//! 纯转换，不做任何网络请求。

use crate::error::ValidationError;
use crate::models::Document;
use tracing::debug;

/// 提交模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionMode {
    /// 单份简历，返回候选人详情
    Single,
    /// 多份简历 + 职位描述，返回排名
    Batch,
}

impl SubmissionMode {
    /// 根据选择推断模式：多份简历或填写了职位描述时使用批量模式
    pub fn infer(document_count: usize, job_description: Option<&str>) -> Self {
        let has_description = job_description.is_some_and(|d| !d.trim().is_empty());
        if document_count > 1 || has_description {
            SubmissionMode::Batch
        } else {
            SubmissionMode::Single
        }
    }
}

/// multipart 中的一个部分
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadPart {
    File {
        field: &'static str,
        document: Document,
    },
    Text {
        field: &'static str,
        value: String,
    },
}

/// 待发送的负载，部分的顺序即发送顺序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    mode: SubmissionMode,
    parts: Vec<PayloadPart>,
}

impl Payload {
    pub fn mode(&self) -> SubmissionMode {
        self.mode
    }

    pub fn parts(&self) -> &[PayloadPart] {
        &self.parts
    }

    /// 按顺序返回所有简历
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.parts.iter().filter_map(|p| match p {
            PayloadPart::File { document, .. } => Some(document),
            PayloadPart::Text { .. } => None,
        })
    }

    pub fn job_description(&self) -> Option<&str> {
        self.parts.iter().find_map(|p| match p {
            PayloadPart::Text { field, value } if *field == JOB_DESCRIPTION_FIELD => Some(value.as_str()),
            _ => None,
        })
    }

    /// 本次提交需要的积分（每份简历一个）
    pub fn required_credits(&self) -> u32 {
        self.documents().count() as u32
    }
}

const SINGLE_FILE_FIELD: &str = "file";
const BATCH_FILE_FIELD: &str = "files";
const JOB_DESCRIPTION_FIELD: &str = "job_description";

/// 提交构建器
#[derive(Debug, Default, Clone, Copy)]
pub struct SubmissionBuilder;

impl SubmissionBuilder {
    pub fn new() -> Self {
        Self
    }

    /// 构建负载
    ///
    /// # 参数
    /// - `mode`: 提交模式
    /// - `documents`: 选中的简历，顺序会被保留
    /// - `job_description`: 职位描述，批量模式必填
    ///
    /// # 返回
    /// 校验通过时返回负载，否则返回对应的校验错误
    pub fn build(
        &self,
        mode: SubmissionMode,
        documents: Vec<Document>,
        job_description: Option<&str>,
    ) -> Result<Payload, ValidationError> {
        if documents.is_empty() {
            return Err(ValidationError::NoDocuments);
        }

        let description = job_description.map(str::trim).filter(|d| !d.is_empty());

        let file_field = match mode {
            SubmissionMode::Batch => {
                if description.is_none() {
                    return Err(ValidationError::MissingDescription);
                }
                BATCH_FILE_FIELD
            }
            SubmissionMode::Single => {
                if documents.len() > 1 {
                    return Err(ValidationError::TooManyDocuments {
                        count: documents.len(),
                    });
                }
                SINGLE_FILE_FIELD
            }
        };

        if let Some(empty) = documents.iter().find(|d| d.content.is_empty()) {
            return Err(ValidationError::EmptyDocument {
                name: empty.name.clone(),
            });
        }

        debug!(
            "构建负载: 模式 {:?}, {} 份简历, 职位描述 {} 字符",
            mode,
            documents.len(),
            description.map(|d| d.chars().count()).unwrap_or(0)
        );

        let mut parts: Vec<PayloadPart> = documents
            .into_iter()
            .map(|document| PayloadPart::File {
                field: file_field,
                document,
            })
            .collect();

        if let Some(description) = description {
            parts.push(PayloadPart::Text {
                field: JOB_DESCRIPTION_FIELD,
                value: description.to_string(),
            });
        }

        Ok(Payload { mode, parts })
    }
}
