use serde::Serialize;

/// Shape of the answer a question expects, which also drives CMS field mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseType {
    ShortText,
    LongText,
    RichText,
    List,
    Date,
    Currency,
}

impl ResponseType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ShortText => "Short text",
            Self::LongText => "Long text",
            Self::RichText => "Rich text",
            Self::List => "List",
            Self::Date => "Date",
            Self::Currency => "Currency",
        }
    }
}

/// Marks the two date questions whose answers become the advert's opening and
/// closing instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateRole {
    Opening,
    Closing,
}

impl DateRole {
    /// Hour and minute appended to a submitted `[day, month, year]`.
    pub const fn time_component(self) -> [&'static str; 2] {
        match self {
            Self::Opening => ["00", "01"],
            Self::Closing => ["23", "59"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestionValidation {
    pub mandatory: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl QuestionValidation {
    const fn mandatory() -> Self {
        Self {
            mandatory: true,
            min_length: None,
            max_length: None,
        }
    }

    const fn optional() -> Self {
        Self {
            mandatory: false,
            min_length: None,
            max_length: None,
        }
    }

    const fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvertDefinitionQuestion {
    pub id: &'static str,
    pub title: &'static str,
    pub response_type: ResponseType,
    pub validation: QuestionValidation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_role: Option<DateRole>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvertDefinitionPage {
    pub id: &'static str,
    pub title: &'static str,
    pub questions: Vec<AdvertDefinitionQuestion>,
}

impl AdvertDefinitionPage {
    pub fn question(&self, question_id: &str) -> Option<&AdvertDefinitionQuestion> {
        self.questions
            .iter()
            .find(|question| question.id == question_id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvertDefinitionSection {
    pub id: &'static str,
    pub title: &'static str,
    pub pages: Vec<AdvertDefinitionPage>,
}

impl AdvertDefinitionSection {
    pub fn page(&self, page_id: &str) -> Option<&AdvertDefinitionPage> {
        self.pages.iter().find(|page| page.id == page_id)
    }
}

/// Static schema of everything an advert author must answer before publishing.
#[derive(Debug, Clone, Serialize)]
pub struct AdvertDefinition {
    pub sections: Vec<AdvertDefinitionSection>,
}

impl AdvertDefinition {
    pub fn section(&self, section_id: &str) -> Option<&AdvertDefinitionSection> {
        self.sections
            .iter()
            .find(|section| section.id == section_id)
    }

    pub fn page(&self, section_id: &str, page_id: &str) -> Option<&AdvertDefinitionPage> {
        self.section(section_id)
            .and_then(|section| section.page(page_id))
    }

    /// Looks a question up across every section; question ids are globally unique.
    pub fn question(&self, question_id: &str) -> Option<&AdvertDefinitionQuestion> {
        self.questions().find(|question| question.id == question_id)
    }

    pub fn questions(&self) -> impl Iterator<Item = &AdvertDefinitionQuestion> {
        self.sections
            .iter()
            .flat_map(|section| section.pages.iter())
            .flat_map(|page| page.questions.iter())
    }

    pub fn date_question(&self, role: DateRole) -> Option<&AdvertDefinitionQuestion> {
        self.questions()
            .find(|question| question.date_role == Some(role))
    }

    /// The advert definition used by the "Find a grant" service.
    pub fn standard() -> Self {
        Self {
            sections: vec![
                AdvertDefinitionSection {
                    id: "grantDetails",
                    title: "Grant details",
                    pages: vec![
                        page(
                            "1",
                            "Short description",
                            vec![question(
                                "grantShortDescription",
                                "Add a short description of the grant",
                                ResponseType::LongText,
                                QuestionValidation::mandatory().length(2, 800),
                            )],
                        ),
                        page(
                            "2",
                            "Location",
                            vec![question(
                                "grantLocation",
                                "Where is the grant available?",
                                ResponseType::List,
                                QuestionValidation::mandatory(),
                            )],
                        ),
                        page(
                            "3",
                            "Funding organisation",
                            vec![question(
                                "grantFunder",
                                "Which organisation is funding this grant?",
                                ResponseType::ShortText,
                                QuestionValidation::mandatory().length(2, 256),
                            )],
                        ),
                        page(
                            "4",
                            "Who can apply",
                            vec![question(
                                "grantApplicantType",
                                "Who can apply for this grant?",
                                ResponseType::List,
                                QuestionValidation::mandatory(),
                            )],
                        ),
                    ],
                },
                AdvertDefinitionSection {
                    id: "awardAmounts",
                    title: "Award amounts",
                    pages: vec![page(
                        "1",
                        "How much funding is available?",
                        vec![
                            question(
                                "grantTotalAwardAmount",
                                "Total amount of the grant",
                                ResponseType::Currency,
                                QuestionValidation::mandatory(),
                            ),
                            question(
                                "grantMaximumAward",
                                "Maximum amount someone can apply for",
                                ResponseType::Currency,
                                QuestionValidation::mandatory(),
                            ),
                            question(
                                "grantMinimumAward",
                                "Minimum amount someone can apply for",
                                ResponseType::Currency,
                                QuestionValidation::mandatory(),
                            ),
                        ],
                    )],
                },
                AdvertDefinitionSection {
                    id: "applicationDates",
                    title: "Application dates",
                    pages: vec![page(
                        "1",
                        "Opening and closing dates",
                        vec![
                            date_question(
                                "grantApplicationOpenDate",
                                "Opening date",
                                DateRole::Opening,
                            ),
                            date_question(
                                "grantApplicationCloseDate",
                                "Closing date",
                                DateRole::Closing,
                            ),
                        ],
                    )],
                },
                AdvertDefinitionSection {
                    id: "howToApply",
                    title: "How to apply",
                    pages: vec![page(
                        "1",
                        "Link to application form",
                        vec![question(
                            "grantWebpageUrl",
                            "Add a link so applicants know where to apply",
                            ResponseType::ShortText,
                            QuestionValidation::mandatory().length(8, 256),
                        )],
                    )],
                },
                AdvertDefinitionSection {
                    id: "furtherInformation",
                    title: "Advert details",
                    pages: vec![
                        rich_text_page("1", "Eligibility information", "grantEligibilityTab", true),
                        rich_text_page("2", "Summary information", "grantSummaryTab", true),
                        rich_text_page("3", "Dates", "grantDatesTab", false),
                        rich_text_page("4", "Objectives of the grant", "grantObjectivesTab", false),
                        rich_text_page("5", "How to apply", "grantApplyTab", false),
                        rich_text_page(
                            "6",
                            "Supporting information",
                            "grantSupportingInfoTab",
                            false,
                        ),
                    ],
                },
            ],
        }
    }
}

fn page(
    id: &'static str,
    title: &'static str,
    questions: Vec<AdvertDefinitionQuestion>,
) -> AdvertDefinitionPage {
    AdvertDefinitionPage {
        id,
        title,
        questions,
    }
}

fn question(
    id: &'static str,
    title: &'static str,
    response_type: ResponseType,
    validation: QuestionValidation,
) -> AdvertDefinitionQuestion {
    AdvertDefinitionQuestion {
        id,
        title,
        response_type,
        validation,
        date_role: None,
    }
}

fn date_question(
    id: &'static str,
    title: &'static str,
    role: DateRole,
) -> AdvertDefinitionQuestion {
    AdvertDefinitionQuestion {
        date_role: Some(role),
        ..question(id, title, ResponseType::Date, QuestionValidation::mandatory())
    }
}

fn rich_text_page(
    page_id: &'static str,
    title: &'static str,
    question_id: &'static str,
    mandatory: bool,
) -> AdvertDefinitionPage {
    let validation = if mandatory {
        QuestionValidation::mandatory()
    } else {
        QuestionValidation::optional()
    };
    page(
        page_id,
        title,
        vec![question(
            question_id,
            title,
            ResponseType::RichText,
            validation.length(0, 6000),
        )],
    )
}
