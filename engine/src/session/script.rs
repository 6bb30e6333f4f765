//! The scripted base questions, asked in order.

pub const INTERVIEW_QUESTIONS: [&str; 6] = [
    "Tell me about yourself.",
    "Why are you interested in this role?",
    "Walk me through a project you're proud of. What was your role?",
    "Describe a time you faced a difficult bug. How did you debug it?",
    "What are your strengths and areas you want to improve?",
    "Do you have any questions for me?",
];
